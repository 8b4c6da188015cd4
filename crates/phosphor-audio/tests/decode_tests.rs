use std::sync::Arc;

use phosphor_audio::{decode_audio, AudioError};
use phosphor_core::{AudioDisplay, Sample, SignalSource, SignalStage, TickWindow};

// ── Helpers ──────────────────────────────────────────────────────

/// Minimal 16-bit PCM WAV file around interleaved samples.
fn wav_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

// ── 1. Decoding ──────────────────────────────────────────────────

#[test]
fn decodes_stereo_pcm_wav() {
    let bytes = wav_i16(&[16384, -16384, 0, -32768, 8192, 0], 2, 8000);
    let audio = decode_audio(bytes, Some("wav")).unwrap();
    assert_eq!(audio.channels, 2);
    assert_eq!(audio.sample_rate, 8000);
    assert_eq!(audio.frames(), 3);
    assert_eq!(audio.samples, vec![0.5, -0.5, 0.0, -1.0, 0.25, 0.0]);
}

#[test]
fn decodes_mono_without_hint() {
    let bytes = wav_i16(&[0, 16384, 0, -16384], 1, 22050);
    let audio = decode_audio(bytes, None).unwrap();
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.frames(), 4);
}

#[test]
fn garbage_is_a_probe_error() {
    let err = decode_audio(vec![0xAB; 512], Some("wav")).unwrap_err();
    assert!(matches!(err, AudioError::Probe(_)), "{err}");
}

// ── 2. Feeding the scope ─────────────────────────────────────────

#[test]
fn decoded_stereo_drives_xy_display() {
    let bytes = wav_i16(&[16384, -16384, 8192, 8192, -32768, 0], 2, 1000);
    let source = Arc::new(decode_audio(bytes, Some("wav")).unwrap().into_source().unwrap());
    let mut stage = SignalStage::new(2, SignalSource::Audio {
        source: Arc::clone(&source),
        display: AudioDisplay::Xy,
    });

    source.start();
    source.advance(3);
    stage.update(&TickWindow::new(0.0, 0.003));
    assert_eq!(stage.buffer().as_slice(), &[Sample::new(0.25, 0.25), Sample::new(-1.0, 0.0)]);
    assert!(source.is_exhausted());
}

#[test]
fn fill_interleaved_plays_decoded_frames_then_silence() {
    let bytes = wav_i16(&[16384, -16384], 2, 1000);
    let source = decode_audio(bytes, Some("wav")).unwrap().into_source().unwrap();
    source.start();
    let mut out = [1.0f32; 4];
    assert_eq!(source.fill_interleaved(&mut out, 2), 1);
    assert_eq!(out, [0.5, -0.5, 0.0, 0.0]);
}
