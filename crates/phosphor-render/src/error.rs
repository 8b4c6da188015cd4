use thiserror::Error;

/// Failures that stop the pipeline from being built or used.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("program failed to link:\n{0}")]
    ProgramLink(String),

    #[error("uniform '{0}' missing from program")]
    MissingUniform(&'static str),

    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    #[error("framebuffer incomplete: 0x{0:X}")]
    IncompleteFramebuffer(u32),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}
