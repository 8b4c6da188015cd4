use std::path::PathBuf;
use thiserror::Error;

use phosphor_core::AudioSourceError;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read audio file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("probe error: {0}")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("no audio track found")]
    NoTrack,

    #[error("decoder error: {0}")]
    Decoder(#[source] symphonia::core::errors::Error),

    #[error("packet error: {0}")]
    Packet(#[source] symphonia::core::errors::Error),

    #[error("stream decoded to zero frames")]
    Empty,

    #[error(transparent)]
    Source(#[from] AudioSourceError),

    #[error("no audio output device available")]
    NoDevice,

    #[error("output device has no config at {rate} Hz")]
    UnsupportedSampleRate { rate: u32 },

    #[error("output sample format {0:?} is not supported")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to query output configs: {0}")]
    StreamConfig(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}
