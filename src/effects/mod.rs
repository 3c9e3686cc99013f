pub mod feedback;
pub mod particles;
pub mod prng;
pub mod shader;

pub use feedback::FeedbackCompositor;
pub use particles::{Emitter, ParticleSystem};
pub use prng::{mix32, DeterministicPrng};
pub use shader::{ShaderPipeline, ShaderProgram, Uniforms};
