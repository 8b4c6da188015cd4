//! Audio collaborators for the scope: file decoding into an [`AudioSource`]
//! and a real-time output stream that advances its cursor.
//!
//! [`AudioSource`]: phosphor_core::AudioSource

pub mod decode;
pub mod error;
pub mod playback;

pub use decode::{decode_audio, load_audio_file, DecodedAudio};
pub use error::AudioError;
pub use playback::Playback;
