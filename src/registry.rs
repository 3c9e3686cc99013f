use crate::error::EngineError;
use crate::manifest::{builtin_presets, load_manifest, PresetDef};
use crate::visual::{PresetCtor, PresetEnv};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Closed enumeration of render families. Dispatch is keyed on this enum,
/// never on string concatenation; extension happens through registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectFamily {
    Waveform,
    Bars,
    Plasma,
    Spirograph,
    FlowField,
    MatrixRain,
    Particles,
    Starfield,
    KaleidoTunnel,
    Collage,
}

impl EffectFamily {
    pub const ALL: [Self; 10] = [
        Self::Waveform,
        Self::Bars,
        Self::Plasma,
        Self::Spirograph,
        Self::FlowField,
        Self::MatrixRain,
        Self::Particles,
        Self::Starfield,
        Self::KaleidoTunnel,
        Self::Collage,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Waveform => "waveform",
            Self::Bars => "bars",
            Self::Plasma => "plasma",
            Self::Spirograph => "spirograph",
            Self::FlowField => "flowfield",
            Self::MatrixRain => "matrixrain",
            Self::Particles => "particles",
            Self::Starfield => "starfield",
            Self::KaleidoTunnel => "kaleidotunnel",
            Self::Collage => "collage",
        }
    }

    /// Canonicalize a manifest kind (lowercase alphanumerics) and match it
    /// against the closed set. Unknown kinds return `None` and resolve to
    /// `RenderEntryNotFound` later.
    pub fn parse(kind: &str) -> Option<Self> {
        let canon: String =
            kind.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_lowercase();
        Self::ALL.iter().copied().find(|f| f.canonical_name() == canon)
    }
}

impl fmt::Display for EffectFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Explicit family → render-entry map, validated at registration time so a
/// missing mapping is caught before first render.
pub struct Bindings {
    map: HashMap<EffectFamily, PresetCtor>,
}

impl Bindings {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn register(&mut self, family: EffectFamily, ctor: PresetCtor) {
        self.map.insert(family, ctor);
    }

    pub fn get(&self, family: EffectFamily) -> Option<PresetCtor> {
        self.map.get(&family).copied()
    }

    /// Every closed-set family must have an entry.
    pub fn validate_complete(&self) -> Result<(), EngineError> {
        for family in EffectFamily::ALL {
            if !self.map.contains_key(&family) {
                return Err(EngineError::RenderEntryNotFound {
                    kind: family.canonical_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Bindings {
    fn default() -> Self {
        crate::visual::builtin_bindings()
    }
}

/// Where the ordered preset list comes from, in order of preference.
pub enum PresetSource<'a> {
    Supplied(Vec<PresetDef>),
    File(&'a Path),
    Builtin,
}

/// One-way, best-effort snapshot for an external display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatus {
    pub preset_name: String,
    pub preset_index: usize,
    pub preset_count: usize,
    pub status: String,
}

pub struct PresetRegistry {
    defs: Vec<PresetDef>,
    index: usize,
    bindings: Bindings,
    load_note: String,
}

impl PresetRegistry {
    /// Load order of preference: supplied list, manifest file, built-in
    /// fallback. Any failure or an empty result degrades to the built-in
    /// list, so the effective registry always has length >= 1.
    pub fn load(source: PresetSource<'_>, bindings: Bindings) -> Self {
        let (defs, load_note) = match source {
            PresetSource::Supplied(defs) if !defs.is_empty() => (defs, "Ready".to_string()),
            PresetSource::Supplied(_) => {
                log::warn!("supplied preset list is empty; using built-in presets");
                (builtin_presets(), "Ready (built-in presets)".to_string())
            }
            PresetSource::File(path) => match load_manifest(path) {
                Ok(defs) => (defs, "Ready".to_string()),
                Err(e) => {
                    log::warn!("preset manifest '{}' unusable: {e}; using built-in presets", path.display());
                    (builtin_presets(), format!("Ready (built-in presets; manifest: {e})"))
                }
            },
            PresetSource::Builtin => (builtin_presets(), "Ready".to_string()),
        };

        Self { defs, index: 0, bindings, load_note }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defs(&self) -> &[PresetDef] {
        &self.defs
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &PresetDef {
        &self.defs[self.index]
    }

    /// Wraps modulo the list length for any step size; never panics for
    /// length >= 1.
    pub fn advance(&mut self, step: isize) {
        let len = self.defs.len() as isize;
        if len == 0 {
            return;
        }
        self.index = (self.index as isize + step).rem_euclid(len) as usize;
    }

    /// No-op for any index outside [0, len).
    pub fn select(&mut self, index: usize) {
        if index < self.defs.len() {
            self.index = index;
        }
    }

    /// Find the starting preset by index or name substring.
    pub fn select_by_query(&mut self, query: &str) {
        let q = query.trim();
        if q.is_empty() {
            return;
        }
        if let Ok(i) = q.parse::<usize>() {
            self.select(i);
            return;
        }
        let q_l = q.to_lowercase();
        if let Some(i) = self.defs.iter().position(|d| d.name.to_lowercase().contains(&q_l)) {
            self.index = i;
        }
    }

    /// Map a declared kind to its registered render entry.
    pub fn resolve(&self, kind: &str) -> Result<PresetCtor, EngineError> {
        let family = EffectFamily::parse(kind)
            .ok_or_else(|| EngineError::RenderEntryNotFound { kind: kind.to_string() })?;
        self.bindings
            .get(family)
            .ok_or_else(|| EngineError::RenderEntryNotFound { kind: kind.to_string() })
    }

    /// Instantiate the render entry for the current preset.
    pub fn instantiate_current(&self, env: &PresetEnv) -> Result<Box<dyn crate::visual::Preset>, EngineError> {
        let ctor = self.resolve(&self.current().kind)?;
        Ok(ctor(env))
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            preset_name: self.current().name.clone(),
            preset_index: self.index,
            preset_count: self.defs.len(),
            status: self.load_note.clone(),
        }
    }
}
