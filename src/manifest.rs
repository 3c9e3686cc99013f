use std::fmt;
use std::path::Path;

/// One record of the preset source contract: an ordered sequence of
/// `{name, kind, description}`. `kind` stays a free string here so unknown
/// kinds load fine and only fail at resolve time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDef {
    pub name: String,
    pub kind: String,
    pub description: String,
}

impl PresetDef {
    pub fn new(name: &str, kind: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    Io(String),
    Parse { line: usize, message: String },
    Empty,
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Empty => write!(f, "manifest contains no presets"),
        }
    }
}

impl std::error::Error for ManifestError {}

/// Parse a preset manifest: one `name|kind|description` record per line,
/// `#` comments and blank lines skipped.
pub fn parse_manifest(text: &str) -> Result<Vec<PresetDef>, ManifestError> {
    let mut defs = Vec::new();
    for (line_idx, raw) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.splitn(3, '|');
        let name = parts.next().map(str::trim).unwrap_or_default();
        let kind = parts.next().map(str::trim).ok_or(ManifestError::Parse {
            line: line_no,
            message: "expected <name>|<kind>|<description>".to_string(),
        })?;
        let description = parts.next().map(str::trim).unwrap_or_default();

        if name.is_empty() {
            return Err(ManifestError::Parse {
                line: line_no,
                message: "preset name must not be empty".to_string(),
            });
        }
        if kind.is_empty() {
            return Err(ManifestError::Parse {
                line: line_no,
                message: "preset kind must not be empty".to_string(),
            });
        }

        defs.push(PresetDef::new(name, kind, description));
    }

    if defs.is_empty() {
        return Err(ManifestError::Empty);
    }
    Ok(defs)
}

pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<PresetDef>, ManifestError> {
    let text =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ManifestError::Io(e.to_string()))?;
    parse_manifest(&text)
}

pub fn manifest_to_text(defs: &[PresetDef]) -> String {
    defs.iter()
        .map(|d| format!("{}|{}|{}", d.name, d.kind, d.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Built-in preset list: the engine stays usable with zero external assets.
pub fn builtin_presets() -> Vec<PresetDef> {
    vec![
        PresetDef::new("Pulse Wave", "waveform", "audio-reactive baseline pulse"),
        PresetDef::new("Spectrum Towers", "bars", "band energy as glowing columns"),
        PresetDef::new("Plasma Storm", "plasma", "interference plasma, shader-backed"),
        PresetDef::new("Spirograph Bloom", "spirograph", "deterministic orbital curves"),
        PresetDef::new("Liquid Echo", "flowfield", "milk-style feedback flow"),
        PresetDef::new("Glyph Rain", "matrixrain", "falling glyph columns"),
        PresetDef::new("Ember Burst", "particles", "bass-driven particle fountain"),
        PresetDef::new("Starfall", "starfield", "volume-accelerated starfield"),
        PresetDef::new("Mirror Tunnel", "kaleidotunnel", "kaleidoscope fold over echo trails"),
        PresetDef::new("Tile Drift", "collage", "slow pan/zoom tile collage"),
    ]
}
