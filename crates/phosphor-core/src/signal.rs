use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio_source::AudioSource;
use crate::buffer::SignalBuffer;
use crate::generator::{AudioWindow, PeriodicSignal, TickWindow};
use crate::sample::Sample;

/// How the buffer is refreshed each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Every sample recomputed from the generator.
    Regenerate,
    /// Newly played frames pushed, oldest dropped.
    Slide,
}

/// How decoded audio is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioDisplay {
    /// x = time across the buffer, y = channel average.
    #[default]
    TimeDomain,
    /// x = first channel, y = second channel (first again for mono).
    Xy,
}

/// Where trace samples come from.
#[derive(Debug, Clone)]
pub enum SignalSource {
    Periodic(PeriodicSignal),
    Audio {
        source: Arc<AudioSource>,
        display: AudioDisplay,
    },
}

impl SignalSource {
    pub fn update_mode(&self) -> UpdateMode {
        match self {
            SignalSource::Periodic(_) => UpdateMode::Regenerate,
            SignalSource::Audio { display: AudioDisplay::TimeDomain, .. } => UpdateMode::Regenerate,
            SignalSource::Audio { display: AudioDisplay::Xy, .. } => UpdateMode::Slide,
        }
    }
}

/// Owns the signal buffer and keeps it current, one update per tick.
pub struct SignalStage {
    buffer: SignalBuffer,
    source: SignalSource,
    last_cursor: usize,
}

impl SignalStage {
    pub fn new(capacity: usize, source: SignalSource) -> Self {
        Self {
            buffer: SignalBuffer::new(capacity),
            source,
            last_cursor: 0,
        }
    }

    pub fn buffer(&self) -> &SignalBuffer {
        &self.buffer
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.source.update_mode()
    }

    /// The decoded audio behind this stage, if any.
    pub fn audio(&self) -> Option<&Arc<AudioSource>> {
        match &self.source {
            SignalSource::Audio { source, .. } => Some(source),
            SignalSource::Periodic(_) => None,
        }
    }

    /// Rewind the audio to its first frame and drop the history drawn from
    /// the previous run. Periodic sources are unaffected.
    pub fn restart_audio(&mut self) {
        if let SignalSource::Audio { source, .. } = &self.source {
            source.restart();
            self.buffer.clear();
            self.last_cursor = 0;
        }
    }

    /// Bring the buffer up to date for `window`. Must run once per tick,
    /// before the buffer is uploaded.
    pub fn update(&mut self, window: &TickWindow) {
        match &self.source {
            SignalSource::Periodic(signal) => self.buffer.regenerate(signal, window),
            SignalSource::Audio { source, display: AudioDisplay::TimeDomain } => {
                self.buffer.regenerate(&AudioWindow::snapshot(source), window);
            }
            SignalSource::Audio { source, display: AudioDisplay::Xy } => {
                let cursor = source.cursor();
                let from = self.last_cursor.min(cursor);
                self.buffer.slide_extend((from..cursor).map(|i| xy_sample(source, i)));
                self.last_cursor = cursor;
            }
        }
    }
}

fn xy_sample(source: &AudioSource, index: usize) -> Sample {
    match source.frame(index) {
        Some(frame) => {
            let x = frame[0];
            let y = frame.get(1).copied().unwrap_or(x);
            Sample::new(x, y)
        }
        None => Sample::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::{ChannelSpec, Waveform};

    fn stereo(frames: usize) -> Arc<AudioSource> {
        let samples: Vec<f32> = (0..frames)
            .flat_map(|i| [i as f32 * 0.01, -(i as f32) * 0.01])
            .collect();
        Arc::new(AudioSource::new(samples, 2, 1000).unwrap())
    }

    #[test]
    fn test_update_mode_per_source() {
        let periodic = SignalSource::Periodic(PeriodicSignal::new(
            ChannelSpec::default(),
            ChannelSpec::default(),
        ));
        assert_eq!(periodic.update_mode(), UpdateMode::Regenerate);
        let xy = SignalSource::Audio { source: stereo(4), display: AudioDisplay::Xy };
        assert_eq!(xy.update_mode(), UpdateMode::Slide);
    }

    #[test]
    fn test_periodic_stage_regenerates() {
        let signal = PeriodicSignal::new(
            ChannelSpec::new(Waveform::Sawtooth, 1.0, 1.0, 0.0),
            ChannelSpec::new(Waveform::Sawtooth, 1.0, 1.0, 0.0),
        );
        let mut stage = SignalStage::new(4, SignalSource::Periodic(signal));
        stage.update(&TickWindow::new(0.0, 1.0));
        assert!(stage.buffer().newest().approx_eq(&Sample::new(-1.0, -1.0)));
    }

    #[test]
    fn test_xy_stage_pushes_played_frames() {
        let source = stereo(10);
        let mut stage = SignalStage::new(4, SignalSource::Audio {
            source: Arc::clone(&source),
            display: AudioDisplay::Xy,
        });
        let w = TickWindow::new(0.0, 0.01);

        source.start();
        source.advance(2);
        stage.update(&w);
        let xs: Vec<f32> = stage.buffer().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 0.0, 0.01]);

        source.advance(3);
        stage.update(&w);
        let newest = stage.buffer().newest();
        assert_eq!(newest, Sample::new(0.04, -0.04));

        // Nothing played: history stays put.
        stage.update(&w);
        assert_eq!(stage.buffer().newest(), newest);
    }

    #[test]
    fn test_xy_stage_clears_on_restart() {
        let source = stereo(10);
        let mut stage = SignalStage::new(4, SignalSource::Audio {
            source: Arc::clone(&source),
            display: AudioDisplay::Xy,
        });
        let w = TickWindow::new(0.0, 0.01);
        source.start();
        source.advance(6);
        stage.update(&w);
        source.advance(2);

        stage.restart_audio();
        assert_eq!(source.cursor(), 0);
        assert!(source.is_playing());
        assert!(stage.buffer().iter().all(|p| *p == Sample::ZERO));

        // The output stream can run past the old position before the next update.
        source.advance(7);
        stage.update(&w);
        let xs: Vec<f32> = stage.buffer().iter().map(|p| p.x).collect();
        let expected: Vec<f32> = (3..7).map(|i| i as f32 * 0.01).collect();
        assert_eq!(xs, expected);
    }

    #[test]
    fn test_restart_audio_ignores_periodic_source() {
        let signal = PeriodicSignal::new(ChannelSpec::default(), ChannelSpec::default());
        let mut stage = SignalStage::new(4, SignalSource::Periodic(signal));
        stage.update(&TickWindow::new(0.0, 0.5));
        let before: Vec<Sample> = stage.buffer().iter().copied().collect();
        stage.restart_audio();
        assert_eq!(stage.buffer().iter().copied().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_time_domain_stage_is_silent_when_exhausted() {
        let source = stereo(3);
        let mut stage = SignalStage::new(8, SignalSource::Audio {
            source: Arc::clone(&source),
            display: AudioDisplay::TimeDomain,
        });
        source.start();
        source.advance(3);
        stage.update(&TickWindow::new(0.0, 0.01));
        assert!(stage.buffer().iter().all(|p| p.y == 0.0));
        assert_eq!(stage.buffer().as_slice()[0].x, -1.0);
        assert_eq!(stage.buffer().newest().x, 1.0);
    }
}
