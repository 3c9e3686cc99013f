use crate::capability::CapabilityReport;
use std::fmt;

/// Uniform-like parameter block shared by the shader path and the 2D
/// fallback path. Metrics are passed in explicitly; no render path reads
/// them from anywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniforms {
    pub time: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub volume: f32,
    pub width: f32,
    pub height: f32,
}

/// Per-pixel kernel in normalized centered coordinates; returns linear RGB
/// in [0, 1].
pub type Kernel = fn(&Uniforms, f32, f32) -> [f32; 3];

/// Uniform names the pipeline can bind. Programs declaring anything else
/// fail to link.
const SUPPORTED_UNIFORMS: &[&str] =
    &["time", "bass", "mid", "treble", "volume", "width", "height"];

#[derive(Debug, Clone, PartialEq)]
pub enum ShaderLinkError {
    EngineUnavailable,
    MissingEntry { program: String },
    UnknownUniform { program: String, uniform: String },
}

impl fmt::Display for ShaderLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineUnavailable => write!(f, "shader engine not available on this runtime"),
            Self::MissingEntry { program } => {
                write!(f, "program '{program}' declares no entry point")
            }
            Self::UnknownUniform { program, uniform } => {
                write!(f, "program '{program}' binds unknown uniform '{uniform}'")
            }
        }
    }
}

impl std::error::Error for ShaderLinkError {}

/// A preset's shader half: a named program with declared uniform bindings
/// and a per-pixel kernel standing in for the compiled stage.
#[derive(Clone)]
pub struct ShaderProgram {
    pub name: &'static str,
    pub entry: &'static str,
    pub uniforms: &'static [&'static str],
    pub kernel: Kernel,
}

impl ShaderProgram {
    fn link(&self, caps: &CapabilityReport) -> Result<(), ShaderLinkError> {
        if !caps.shader_allowed() {
            return Err(ShaderLinkError::EngineUnavailable);
        }
        if self.entry.trim().is_empty() {
            return Err(ShaderLinkError::MissingEntry { program: self.name.to_string() });
        }
        for u in self.uniforms {
            if !SUPPORTED_UNIFORMS.contains(u) {
                return Err(ShaderLinkError::UnknownUniform {
                    program: self.name.to_string(),
                    uniform: u.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    Shader,
    Fallback,
}

/// Shader-with-fallback pipeline rendering into an offscreen target sized
/// to the surface. Link failure at construction transparently selects the
/// 2D fallback; both paths share the same signature and uniforms.
pub struct ShaderPipeline {
    program: ShaderProgram,
    fallback: Kernel,
    mode: PipelineMode,
    target: Vec<u8>,
    w: usize,
    h: usize,
}

impl ShaderPipeline {
    pub fn new(program: ShaderProgram, fallback: Kernel, caps: &CapabilityReport) -> Self {
        let mode = match program.link(caps) {
            Ok(()) => PipelineMode::Shader,
            Err(e) => {
                log::warn!("shader link failed, using 2D fallback: {e}");
                PipelineMode::Fallback
            }
        };
        Self { program, fallback, mode, target: Vec::new(), w: 0, h: 0 }
    }

    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    pub fn program_name(&self) -> &'static str {
        self.program.name
    }

    /// Offscreen target follows the surface; recreated on any size change.
    pub fn ensure_size(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        self.w = w;
        self.h = h;
        self.target = vec![0; w.saturating_mul(h).saturating_mul(4)];
    }

    /// Evaluate the active kernel across the target and return the frame.
    pub fn render(&mut self, uniforms: &Uniforms) -> &[u8] {
        let kernel = match self.mode {
            PipelineMode::Shader => self.program.kernel,
            PipelineMode::Fallback => self.fallback,
        };
        let (w, h) = (self.w, self.h);
        if w == 0 || h == 0 {
            return &self.target;
        }
        for y in 0..h {
            let ny = (y as f32 / h as f32) * 2.0 - 1.0;
            for x in 0..w {
                let nx = (x as f32 / w as f32) * 2.0 - 1.0;
                let rgb = kernel(uniforms, nx, ny);
                let i = (y * w + x) * 4;
                self.target[i] = (rgb[0].clamp(0.0, 1.0) * 255.0) as u8;
                self.target[i + 1] = (rgb[1].clamp(0.0, 1.0) * 255.0) as u8;
                self.target[i + 2] = (rgb[2].clamp(0.0, 1.0) * 255.0) as u8;
                self.target[i + 3] = 255;
            }
        }
        &self.target
    }
}
