use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "pulseviz", version, about = "Audio-reactive generative visualizer for the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSourceKind::Mic)]
    pub source: AudioSourceKind,

    /// Substring match against input device names.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, value_enum, default_value_t = EngineMode::Shader)]
    pub engine: EngineMode,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Seed for reproducible preset randomness; a fresh seed is drawn when absent.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start on the preset matching this name or index.
    #[arg(long)]
    pub preset: Option<String>,

    /// Preset manifest file (`name|kind|description` per line).
    #[arg(long)]
    pub presets_file: Option<String>,

    /// Tile library for the collage preset.
    #[arg(long)]
    pub tiles_file: Option<String>,

    /// Force the surface to an explicit size instead of probing the terminal.
    #[arg(long)]
    pub surface_width: Option<usize>,

    #[arg(long)]
    pub surface_height: Option<usize>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSourceKind {
    Mic,
    /// No capture backend; metrics stay zero and presets render silently.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "hb")]
    HalfBlock,
    #[value(alias = "text")]
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineMode {
    /// Try the shader pipeline first; presets fall back per link failure.
    #[value(alias = "gpu")]
    Shader,
    Cpu,
}
