pub mod audio_source;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod generator;
pub mod sample;
pub mod signal;
pub mod waveform;

pub use audio_source::AudioSource;
pub use buffer::SignalBuffer;
pub use clock::FrameClock;
pub use config::ScopeConfig;
pub use error::{AudioSourceError, ConfigError};
pub use generator::{AudioWindow, PeriodicSignal, SignalGenerator, TickWindow, MIN_SAMPLE_SPAN};
pub use sample::Sample;
pub use signal::{AudioDisplay, SignalSource, SignalStage, UpdateMode};
pub use waveform::{ChannelSpec, Waveform};
