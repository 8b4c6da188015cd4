use crate::generator::TickWindow;

/// Turns wall-clock readings (or synthetic deltas) into per-tick windows.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    now: Option<f64>,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tick ending at absolute time `now` (seconds). The first
    /// call yields a zero-length tick. Time going backwards is treated as a
    /// zero-length tick rather than a negative one.
    pub fn tick_at(&mut self, now: f64) -> TickWindow {
        let t0 = self.now.unwrap_or(now);
        let dt = (now - t0).max(0.0);
        self.now = Some(t0 + dt);
        self.elapsed += dt;
        TickWindow { t0, dt, elapsed: self.elapsed }
    }

    /// Register a tick of length `dt` following the previous one.
    pub fn tick_delta(&mut self, dt: f64) -> TickWindow {
        let t0 = *self.now.get_or_insert(0.0);
        self.tick_at(t0 + dt.max(0.0))
    }

    /// Accumulated run time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_tick_is_empty() {
        let mut clock = FrameClock::new();
        let w = clock.tick_at(10.0);
        assert_eq!(w.t0, 10.0);
        assert_eq!(w.dt, 0.0);
        assert_eq!(w.elapsed, 0.0);
    }

    #[test]
    fn test_ticks_chain() {
        let mut clock = FrameClock::new();
        clock.tick_at(1.0);
        let w = clock.tick_at(1.25);
        assert_abs_diff_eq!(w.t0, 1.0);
        assert_abs_diff_eq!(w.dt, 0.25);
        let w = clock.tick_at(1.5);
        assert_abs_diff_eq!(w.t0, 1.25);
        assert_abs_diff_eq!(clock.elapsed(), 0.5);
    }

    #[test]
    fn test_backwards_time_is_clamped() {
        let mut clock = FrameClock::new();
        clock.tick_at(5.0);
        let w = clock.tick_at(4.0);
        assert_eq!(w.dt, 0.0);
        assert_eq!(w.t0, 5.0);
    }

    #[test]
    fn test_tick_delta_from_zero() {
        let mut clock = FrameClock::new();
        let w = clock.tick_delta(1.0);
        assert_eq!(w.t0, 0.0);
        assert_eq!(w.dt, 1.0);
        let w = clock.tick_delta(0.5);
        assert_eq!(w.t0, 1.0);
        assert_abs_diff_eq!(w.elapsed, 1.5);
    }
}
