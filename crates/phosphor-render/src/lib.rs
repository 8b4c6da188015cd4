//! The scope's multi-pass renderer: beam, persistence, graticule and
//! present, over OpenGL 3.3 or on the CPU.

pub mod beam;
pub mod driver;
pub mod error;
pub mod events;
pub mod fbo;
pub mod graticule;
pub mod persistence;
pub mod pipeline;
pub mod present;
pub mod program;
pub mod quad;
pub mod renderer;
pub mod settings;
pub mod shaders;
pub mod software;
pub mod targets;
pub mod uniforms;

pub use driver::ScopeDriver;
pub use error::RenderError;
pub use events::{EventQueue, EventSender, PendingEvents, ScopeEvent};
pub use pipeline::{PassBackend, Pipeline, TickOutcome};
pub use renderer::ScopeRenderer;
pub use settings::RenderSettings;
pub use software::{Raster, SoftwareBackend};
pub use targets::{FrameTarget, FrameTargets, Size};
pub use uniforms::{decay_factor, FrameUniforms};
