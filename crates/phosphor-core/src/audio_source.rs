use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::AudioSourceError;

/// Decoded PCM shared between the playback callback and the render loop.
///
/// The playback side advances the cursor and the render loop may rewind it,
/// so every advance is a compare-and-swap that loses to a concurrent restart.
/// The render loop loads the cursor once per tick; a frame of skew between
/// the two is expected and harmless.
#[derive(Debug)]
pub struct AudioSource {
    samples: Box<[f32]>,
    channels: usize,
    sample_rate: u32,
    frames: usize,
    cursor: AtomicUsize,
    playing: AtomicBool,
    started: AtomicBool,
}

impl AudioSource {
    /// Wrap interleaved samples. Playback starts stopped with the cursor at 0.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self, AudioSourceError> {
        if channels == 0 {
            return Err(AudioSourceError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(AudioSourceError::ZeroSampleRate);
        }
        if samples.len() % channels != 0 {
            return Err(AudioSourceError::RaggedFrames { len: samples.len(), channels });
        }

        let frames = samples.len() / channels;
        Ok(Self {
            samples: samples.into_boxed_slice(),
            channels,
            sample_rate,
            frames,
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            started: AtomicBool::new(false),
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Current playback position in frames.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Playing and not yet at the end of the stream.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire) && !self.is_exhausted()
    }

    /// Whether playback has been started at least once.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor() >= self.frames
    }

    /// Begin playback from the current cursor. No effect once exhausted.
    pub fn start(&self) {
        if self.is_exhausted() {
            log::debug!("audio source exhausted; start ignored");
            return;
        }
        self.started.store(true, Ordering::Release);
        self.playing.store(true, Ordering::Release);
    }

    /// Rewind to the first frame and play.
    pub fn restart(&self) {
        self.cursor.store(0, Ordering::Release);
        self.started.store(true, Ordering::Release);
        self.playing.store(self.frames > 0, Ordering::Release);
    }

    /// Move the cursor forward by up to `frames`, returning how far it moved.
    /// Reaching the end stops playback.
    pub fn advance(&self, frames: usize) -> usize {
        if !self.is_playing() {
            return 0;
        }
        let total = self.frames;
        let step = |current: usize| Some(current.saturating_add(frames).min(total));
        let previous = match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, step) {
            Ok(previous) | Err(previous) => previous,
        };
        self.moved(previous, previous.saturating_add(frames).min(total))
    }

    /// Move the cursor from `from` to `to` unless someone else moved it first.
    /// A restart landing between a read at `from` and this call wins.
    fn advance_from(&self, from: usize, to: usize) -> usize {
        match self.cursor.compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => self.moved(from, to),
            Err(now) => {
                log::debug!("cursor moved from {from} to {now} during a read; advance dropped");
                0
            }
        }
    }

    fn moved(&self, from: usize, to: usize) -> usize {
        if from < self.frames && to >= self.frames {
            log::info!("audio source reached end of stream");
        }
        to - from
    }

    /// Advance by a wall-clock span, for hosts without an output device.
    pub fn advance_by_time(&self, dt: f64) -> usize {
        if dt <= 0.0 {
            return 0;
        }
        self.advance((dt * self.sample_rate as f64).round() as usize)
    }

    /// Interleaved samples of one frame, or `None` outside the decoded range.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        if index >= self.frames {
            return None;
        }
        let start = index * self.channels;
        Some(&self.samples[start..start + self.channels])
    }

    /// Average of all channels at `index`; silence outside the decoded range.
    pub fn mono(&self, index: usize) -> f32 {
        match self.frame(index) {
            Some(frame) => frame.iter().sum::<f32>() / self.channels as f32,
            None => 0.0,
        }
    }

    /// Copy frames at the cursor into an interleaved output buffer and advance.
    ///
    /// Source channels are mapped onto `out_channels` by wrapping; anything
    /// past the end of the stream (or while stopped) is written as silence.
    /// Returns the number of frames consumed.
    pub fn fill_interleaved(&self, out: &mut [f32], out_channels: usize) -> usize {
        if out_channels == 0 {
            return 0;
        }
        let wanted = out.len() / out_channels;
        let start = self.cursor();
        let available = if self.is_playing() {
            wanted.min(self.frames.saturating_sub(start))
        } else {
            0
        };

        for (i, out_frame) in out.chunks_mut(out_channels).enumerate() {
            match self.frame(start + i).filter(|_| i < available) {
                Some(frame) => {
                    for (ch, slot) in out_frame.iter_mut().enumerate() {
                        *slot = frame[ch % self.channels];
                    }
                }
                None => out_frame.fill(0.0),
            }
        }

        if available == 0 {
            return 0;
        }
        self.advance_from(start, start + available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize) -> AudioSource {
        let samples: Vec<f32> = (0..frames)
            .flat_map(|i| [i as f32, -(i as f32)])
            .collect();
        AudioSource::new(samples, 2, 100).unwrap()
    }

    #[test]
    fn test_rejects_bad_layouts() {
        assert_eq!(AudioSource::new(vec![0.0; 4], 0, 44100).unwrap_err(), AudioSourceError::NoChannels);
        assert_eq!(AudioSource::new(vec![0.0; 4], 2, 0).unwrap_err(), AudioSourceError::ZeroSampleRate);
        assert_eq!(
            AudioSource::new(vec![0.0; 5], 2, 44100).unwrap_err(),
            AudioSourceError::RaggedFrames { len: 5, channels: 2 }
        );
    }

    #[test]
    fn test_advance_requires_playback() {
        let src = stereo_ramp(10);
        assert_eq!(src.advance(3), 0);
        src.start();
        assert_eq!(src.advance(3), 3);
        assert_eq!(src.cursor(), 3);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let src = stereo_ramp(10);
        src.start();
        assert_eq!(src.advance(25), 10);
        assert!(src.is_exhausted());
        assert!(!src.is_playing());
        // Start after exhaustion does nothing; restart rewinds.
        src.start();
        assert!(!src.is_playing());
        src.restart();
        assert_eq!(src.cursor(), 0);
        assert!(src.is_playing());
    }

    #[test]
    fn test_mono_averages_channels_and_pads_silence() {
        let samples = vec![0.5, 0.25, 1.0, -1.0];
        let src = AudioSource::new(samples, 2, 48000).unwrap();
        assert_eq!(src.mono(0), 0.375);
        assert_eq!(src.mono(1), 0.0);
        assert_eq!(src.mono(2), 0.0);
    }

    #[test]
    fn test_advance_by_time() {
        let src = stereo_ramp(1000);
        src.start();
        assert_eq!(src.advance_by_time(0.05), 5);
        assert_eq!(src.advance_by_time(-1.0), 0);
    }

    #[test]
    fn test_fill_interleaved_maps_channels_and_zero_fills() {
        let src = stereo_ramp(3);
        src.start();
        let mut out = [9.0f32; 8]; // 4 stereo frames, only 3 available
        let consumed = src.fill_interleaved(&mut out, 2);
        assert_eq!(consumed, 3);
        assert_eq!(out, [0.0, -0.0, 1.0, -1.0, 2.0, -2.0, 0.0, 0.0]);
        assert!(src.is_exhausted());
    }

    #[test]
    fn test_fill_interleaved_silent_while_stopped() {
        let src = stereo_ramp(4);
        let mut out = [1.0f32; 4];
        assert_eq!(src.fill_interleaved(&mut out, 1), 0);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(src.cursor(), 0);
    }

    #[test]
    fn test_restart_during_fill_is_not_overwritten() {
        let src = stereo_ramp(100);
        src.start();
        src.advance(50);
        // The output callback read frames at 50, then the render loop rewound.
        let read_at = src.cursor();
        src.restart();
        assert_eq!(src.advance_from(read_at, read_at + 8), 0);
        assert_eq!(src.cursor(), 0);
        assert!(src.is_playing());
    }

    #[test]
    fn test_restart_races_with_playback_thread() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let src = Arc::new(stereo_ramp(1_000_000));
        src.start();
        let advanced_once = Arc::new(AtomicBool::new(false));

        let player = {
            let src = Arc::clone(&src);
            let advanced_once = Arc::clone(&advanced_once);
            std::thread::spawn(move || {
                let mut out = [0.0f32; 2];
                let mut total = 0;
                for _ in 0..10_000 {
                    total += src.fill_interleaved(&mut out, 2);
                    advanced_once.store(true, Ordering::Release);
                }
                total
            })
        };

        while !advanced_once.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
        src.restart();
        let total = player.join().unwrap();

        // At least one frame was consumed before the rewind, so the cursor
        // can only hold what was played after it.
        assert!(total >= 1);
        assert!(src.cursor() < total, "cursor {} ignored the restart (played {total})", src.cursor());
    }
}
