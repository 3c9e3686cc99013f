use std::fmt;

/// Engine failure taxonomy. Only `NoSurfaceAvailable` prevents startup;
/// everything else degrades to fallback rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    NoSurfaceAvailable { attempted: Vec<String> },
    AudioUnavailable { reason: String },
    RenderEntryNotFound { kind: String },
    PresetRenderFailure { preset: String, message: String },
    AssetLoadFailure { path: String, message: String },
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoSurfaceAvailable { .. })
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSurfaceAvailable { attempted } => {
                write!(f, "no drawable surface available (tried: {})", attempted.join(", "))
            }
            Self::AudioUnavailable { reason } => {
                write!(f, "audio capture unavailable: {reason}")
            }
            Self::RenderEntryNotFound { kind } => {
                write!(f, "no render entry registered for kind '{kind}'")
            }
            Self::PresetRenderFailure { preset, message } => {
                write!(f, "preset '{preset}' failed to render: {message}")
            }
            Self::AssetLoadFailure { path, message } => {
                write!(f, "asset load failed for '{path}': {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_surface_loss_is_fatal() {
        let surface = EngineError::NoSurfaceAvailable { attempted: vec!["tty".into()] };
        assert!(surface.is_fatal());

        let soft = [
            EngineError::AudioUnavailable { reason: "no device".into() },
            EngineError::RenderEntryNotFound { kind: "unknownKind".into() },
            EngineError::PresetRenderFailure { preset: "p".into(), message: "m".into() },
            EngineError::AssetLoadFailure { path: "tiles.pack".into(), message: "io".into() },
        ];
        for e in soft {
            assert!(!e.is_fatal(), "{e} should be non-fatal");
        }
    }
}
