use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`crate::ScopeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}

/// Errors raised when wrapping decoded PCM into an [`crate::AudioSource`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioSourceError {
    #[error("audio source needs at least one channel")]
    NoChannels,

    #[error("audio source sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("{len} interleaved samples do not divide into {channels} channels")]
    RaggedFrames { len: usize, channels: usize },
}
