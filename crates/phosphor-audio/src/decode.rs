use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::probe::Hint;

use phosphor_core::AudioSource;

use crate::error::AudioError;

/// A fully decoded stream, interleaved frame by frame.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// `samples[frame * channels + channel]`
    pub samples: Vec<f32>,
    pub channels: usize,
    /// Sample rate in Hz (e.g. 44100).
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }

    pub fn into_source(self) -> Result<AudioSource, AudioError> {
        Ok(AudioSource::new(self.samples, self.channels, self.sample_rate)?)
    }
}

/// Read and decode an audio file, using its extension as a format hint.
pub fn load_audio_file(path: &Path) -> Result<DecodedAudio, AudioError> {
    let data = std::fs::read(path).map_err(|source| AudioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path.extension().and_then(|e| e.to_str());
    let audio = decode_audio(data, ext)?;
    log::info!(
        "decoded {}: {} frames, {} ch, {} Hz ({:.2}s)",
        path.display(),
        audio.frames(),
        audio.channels,
        audio.sample_rate,
        audio.duration_secs()
    );
    Ok(audio)
}

/// Decode in-memory file bytes.
///
/// Supports any format symphonia can probe (WAV, FLAC, MP3, OGG, ...).
/// Packets that fail to decode are skipped; a stream with no decodable
/// frames is an error.
pub fn decode_audio(data: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio, AudioError> {
    let cursor = std::io::Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &Default::default(), &Default::default())
        .map_err(AudioError::Probe)?;

    let mut format = probed.format;
    let track = format.default_track().ok_or(AudioError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(AudioError::Decoder)?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Packet(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("skipping undecodable packet: {msg}");
                continue;
            }
            Err(e) => return Err(AudioError::Decoder(e)),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count());
        sample_rate.get_or_insert(spec.rate);

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let channels = channels.unwrap_or(2);
    if samples.len() < channels {
        return Err(AudioError::Empty);
    }
    // A truncated final packet must not leave a partial frame behind.
    samples.truncate(samples.len() - samples.len() % channels);

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate: sample_rate.unwrap_or(44100),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_audio_frames() {
        let audio = DecodedAudio {
            samples: vec![0.0; 200],
            channels: 2,
            sample_rate: 100,
        };
        assert_eq!(audio.frames(), 100);
        assert_eq!(audio.duration_secs(), 1.0);
        let source = audio.into_source().unwrap();
        assert_eq!(source.frames(), 100);
    }

    #[test]
    fn test_invalid_audio_returns_error() {
        let result = decode_audio(b"not audio data".to_vec(), None);
        assert!(matches!(result, Err(AudioError::Probe(_))));
    }

    #[test]
    fn test_empty_audio_returns_error() {
        assert!(decode_audio(Vec::new(), Some("wav")).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_audio_file(Path::new("/nonexistent/tone.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Io { .. }));
    }
}
