use crate::config::{EngineMode, RendererMode};

/// One-shot runtime probe. Presets never detect capabilities themselves;
/// they only supply a shader program and a 2D equivalent, and this report
/// decides which side runs.
#[derive(Debug, Clone)]
pub struct CapabilityReport {
    pub auto_probe: bool,
    pub requested_engine: EngineMode,
    pub requested_renderer: RendererMode,
    pub engine: EngineMode,
    pub renderer: RendererMode,
    notes: Vec<String>,
}

impl CapabilityReport {
    pub fn changed(&self) -> bool {
        self.engine != self.requested_engine || self.renderer != self.requested_renderer
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn shader_allowed(&self) -> bool {
        self.engine == EngineMode::Shader
    }

    pub fn status_label(&self) -> String {
        if !self.auto_probe {
            return format!("off (engine={:?}, renderer={:?})", self.engine, self.renderer);
        }
        if self.changed() {
            return format!(
                "fallback eng {:?}->{:?}, ren {:?}->{:?}",
                self.requested_engine, self.engine, self.requested_renderer, self.renderer
            );
        }
        format!("ok eng={:?}, ren={:?}", self.engine, self.renderer)
    }
}

pub fn probe_runtime(
    requested_engine: EngineMode,
    requested_renderer: RendererMode,
    auto_probe: bool,
) -> CapabilityReport {
    let mut report = CapabilityReport {
        auto_probe,
        requested_engine,
        requested_renderer,
        engine: requested_engine,
        renderer: requested_renderer,
        notes: Vec::new(),
    };

    if !auto_probe {
        report.push_note("capability probe disabled by --auto-probe=false");
        return report;
    }

    if requested_engine == EngineMode::Shader && !shader_engine_available() {
        report.engine = EngineMode::Cpu;
        report.push_note("shader engine unavailable; presets will use their 2D fallback paths");
    }

    if requested_renderer == RendererMode::HalfBlock && !truecolor_available() {
        report.renderer = RendererMode::Ascii;
        report.push_note("truecolor not advertised by this terminal; falling back to ascii renderer");
    }

    if report.notes.is_empty() {
        report.push_note("probe selected requested engine/renderer with no fallback");
    }

    for note in report.notes() {
        log::info!("capability: {note}");
    }

    report
}

fn shader_engine_available() -> bool {
    if let Ok(v) = std::env::var("PULSEVIZ_FORCE_SHADER") {
        let s = v.trim().to_ascii_lowercase();
        if s == "1" || s == "true" || s == "yes" || s == "on" {
            return true;
        }
        if s == "0" || s == "false" || s == "no" || s == "off" {
            return false;
        }
    }
    // The interpreted kernel path has no hard platform requirement; it is
    // only gated off when the host signals a constrained environment.
    std::env::var("PULSEVIZ_NO_SHADER").is_err()
}

fn truecolor_available() -> bool {
    let colorterm = std::env::var("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return true;
    }
    let term = std::env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    term.contains("256color") || term.contains("kitty") || term.contains("ghostty")
}
