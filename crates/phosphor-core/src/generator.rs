//! Signal generators: map a buffer index inside one tick to a trace sample.
//!
//! Index convention used throughout the crate: index 0 is the oldest sample
//! and index `N - 1` the newest. Sample `i` sits at
//! `t0 + ((i + 1) / N) * span`, so the newest sample lands exactly on the end
//! of the tick.

use glam::DVec2;

use crate::audio_source::AudioSource;
use crate::sample::Sample;
use crate::waveform::ChannelSpec;

/// Shortest time span a tick is spread across. Refresh rates above 144 Hz
/// would otherwise squeeze every sample onto nearly the same point.
pub const MIN_SAMPLE_SPAN: f64 = 1.0 / 144.0;

/// Timing of one render tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickWindow {
    /// Start of the tick (seconds).
    pub t0: f64,
    /// Wall-clock duration of the tick (seconds).
    pub dt: f64,
    /// Accumulated run time up to the end of this tick.
    pub elapsed: f64,
}

impl TickWindow {
    pub fn new(t0: f64, dt: f64) -> Self {
        Self { t0, dt, elapsed: t0 + dt }
    }

    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Duration used for index interpolation, never below `min_span`.
    pub fn effective_span(&self, min_span: f64) -> f64 {
        self.dt.max(min_span)
    }
}

/// Interpolated time of sample `index` out of `count`.
pub fn sample_time(index: usize, count: usize, t0: f64, span: f64) -> f64 {
    t0 + ((index + 1) as f64 / count as f64) * span
}

/// Produces the sample at one buffer position for the current tick.
pub trait SignalGenerator {
    fn sample(&self, index: usize, count: usize, window: &TickWindow) -> Sample;
}

/// Two independent periodic channels, X and Y (Lissajous figures when the
/// frequencies differ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicSignal {
    pub x: ChannelSpec,
    pub y: ChannelSpec,
    pub min_span: f64,
}

impl PeriodicSignal {
    pub fn new(x: ChannelSpec, y: ChannelSpec) -> Self {
        Self { x, y, min_span: MIN_SAMPLE_SPAN }
    }

    pub fn with_min_span(mut self, min_span: f64) -> Self {
        self.min_span = min_span;
        self
    }

    /// Evaluate both channels at absolute time `t`.
    pub fn at(&self, t: f64, elapsed: f64) -> DVec2 {
        DVec2::new(self.x.value(t, elapsed), self.y.value(t, elapsed))
    }
}

impl SignalGenerator for PeriodicSignal {
    fn sample(&self, index: usize, count: usize, window: &TickWindow) -> Sample {
        let span = window.effective_span(self.min_span);
        let t = sample_time(index, count, window.t0, span);
        self.at(t, window.elapsed).into()
    }
}

/// Time-domain view of decoded audio: x sweeps left to right across the
/// buffer, y is the channel average.
///
/// The window starts at the playback cursor and reads ahead. The cursor is
/// loaded once at construction so every index of one tick sees the same
/// position.
#[derive(Debug, Clone, Copy)]
pub struct AudioWindow<'a> {
    source: &'a AudioSource,
    cursor: Option<usize>,
}

impl<'a> AudioWindow<'a> {
    pub fn snapshot(source: &'a AudioSource) -> Self {
        let cursor = source.is_started().then(|| source.cursor());
        Self { source, cursor }
    }

    /// Cursor captured for this tick, `None` before playback starts.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }
}

/// Position of `index` across `count` slots, mapped onto [-1, 1].
pub fn index_to_ndc(index: usize, count: usize) -> f32 {
    if count < 2 {
        return 0.0;
    }
    (2.0 * index as f64 / (count - 1) as f64 - 1.0) as f32
}

impl SignalGenerator for AudioWindow<'_> {
    fn sample(&self, index: usize, count: usize, _window: &TickWindow) -> Sample {
        let y = match self.cursor {
            Some(cursor) => self.source.mono(cursor.saturating_add(index)),
            None => 0.0,
        };
        Sample::new(index_to_ndc(index, count), y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::Waveform;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sample_time_newest_at_tick_end() {
        assert_abs_diff_eq!(sample_time(0, 4, 0.0, 1.0), 0.25);
        assert_abs_diff_eq!(sample_time(3, 4, 0.0, 1.0), 1.0);
        assert_abs_diff_eq!(sample_time(0, 1, 2.0, 0.5), 2.5);
    }

    #[test]
    fn test_effective_span_clamped() {
        let w = TickWindow::new(0.0, 0.001);
        assert_abs_diff_eq!(w.effective_span(MIN_SAMPLE_SPAN), MIN_SAMPLE_SPAN);
        let w = TickWindow::new(0.0, 0.1);
        assert_abs_diff_eq!(w.effective_span(MIN_SAMPLE_SPAN), 0.1);
    }

    #[test]
    fn test_short_tick_still_spreads_samples() {
        let sig = PeriodicSignal::new(
            ChannelSpec::new(Waveform::Sawtooth, 1.0, 10.0, 0.0),
            ChannelSpec::new(Waveform::Sawtooth, 1.0, 10.0, 0.0),
        );
        let w = TickWindow::new(0.0, 1e-6);
        let first = sig.sample(0, 8, &w);
        let last = sig.sample(7, 8, &w);
        assert!((last.x - first.x).abs() > 0.05);
    }

    #[test]
    fn test_index_to_ndc() {
        assert_eq!(index_to_ndc(0, 5), -1.0);
        assert_eq!(index_to_ndc(2, 5), 0.0);
        assert_eq!(index_to_ndc(4, 5), 1.0);
        assert_eq!(index_to_ndc(0, 1), 0.0);
    }

    #[test]
    fn test_audio_window_silent_before_start() {
        let src = AudioSource::new(vec![1.0; 8], 1, 8).unwrap();
        let win = AudioWindow::snapshot(&src);
        assert_eq!(win.cursor(), None);
        let w = TickWindow::new(0.0, 0.1);
        assert_eq!(win.sample(1, 4, &w).y, 0.0);
    }

    #[test]
    fn test_audio_window_reads_ahead_of_cursor() {
        let src = AudioSource::new(vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5], 1, 6).unwrap();
        src.start();
        src.advance(2);
        let win = AudioWindow::snapshot(&src);
        let w = TickWindow::new(0.0, 0.1);
        assert_eq!(win.sample(0, 4, &w), Sample::new(-1.0, 0.2));
        assert_eq!(win.sample(3, 4, &w).y, 0.5);
        // Past the end of the stream reads as silence.
        assert_eq!(win.sample(3, 8, &w).y, 0.5);
        assert_eq!(win.sample(4, 8, &w).y, 0.0);
    }
}
