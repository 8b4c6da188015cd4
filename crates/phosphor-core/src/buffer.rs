use crate::generator::{SignalGenerator, TickWindow};
use crate::sample::{self, Sample};

/// Fixed-capacity sequence of trace samples, oldest first.
///
/// Storage is twice the capacity so the live window can slide forward on
/// every push and stay contiguous; it is compacted back to the front once the
/// window reaches the end. That keeps `slide_push` amortized O(1) while
/// `as_slice` is always a single slice ready for upload.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    storage: Box<[Sample]>,
    start: usize,
    capacity: usize,
}

impl SignalBuffer {
    /// Create a buffer of `capacity` samples, all at the origin.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "signal buffer capacity must be non-zero");
        Self {
            storage: vec![Sample::ZERO; capacity * 2].into_boxed_slice(),
            start: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Always equal to the capacity.
    pub fn len(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.storage[self.start..self.start + self.capacity]
    }

    fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.storage[self.start..self.start + self.capacity]
    }

    /// Raw bytes of the live window, for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        sample::as_bytes(self.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.as_slice().iter()
    }

    /// The most recent sample (last index).
    pub fn newest(&self) -> Sample {
        self.as_slice()[self.capacity - 1]
    }

    /// Reset every sample to the origin.
    pub fn clear(&mut self) {
        self.storage.fill(Sample::ZERO);
        self.start = 0;
    }

    /// Overwrite every sample from `generator` for the given tick.
    pub fn regenerate(&mut self, generator: &impl SignalGenerator, window: &TickWindow) {
        let count = self.capacity;
        for (i, slot) in self.as_mut_slice().iter_mut().enumerate() {
            *slot = generator.sample(i, count, window);
        }
    }

    /// Drop the oldest sample and append `sample` as the newest.
    pub fn slide_push(&mut self, sample: Sample) {
        if self.start + self.capacity == self.storage.len() {
            self.storage.copy_within(self.start.., 0);
            self.start = 0;
        }
        self.storage[self.start + self.capacity] = sample;
        self.start += 1;
    }

    /// Push every sample in order. Only the last `capacity` can survive, so
    /// earlier ones are skipped.
    pub fn slide_extend<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Sample>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = samples.into_iter();
        let skip = iter.len().saturating_sub(self.capacity);
        for s in iter.skip(skip) {
            self.slide_push(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IndexGenerator;

    impl SignalGenerator for IndexGenerator {
        fn sample(&self, index: usize, count: usize, window: &TickWindow) -> Sample {
            Sample::new(index as f32, (count as f64 + window.t0) as f32)
        }
    }

    fn s(v: f32) -> Sample {
        Sample::new(v, -v)
    }

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buf = SignalBuffer::new(16);
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|p| *p == Sample::ZERO));
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _ = SignalBuffer::new(0);
    }

    #[test]
    fn test_regenerate_writes_every_slot() {
        let mut buf = SignalBuffer::new(5);
        buf.regenerate(&IndexGenerator, &TickWindow::new(1.0, 0.5));
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(buf.iter().all(|p| p.y == 6.0));
    }

    #[test]
    fn test_slide_push_drops_oldest() {
        let mut buf = SignalBuffer::new(3);
        for v in 1..=5 {
            buf.slide_push(s(v as f32));
        }
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3.0, 4.0, 5.0]);
        assert_eq!(buf.newest(), s(5.0));
    }

    #[test]
    fn test_slide_push_survives_many_compactions() {
        let mut buf = SignalBuffer::new(4);
        for v in 0..1000 {
            buf.slide_push(s(v as f32));
        }
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![996.0, 997.0, 998.0, 999.0]);
    }

    #[test]
    fn test_slide_extend_keeps_tail() {
        let mut buf = SignalBuffer::new(3);
        buf.slide_extend((0..10).map(|v| s(v as f32)));
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_regenerate_after_slide_uses_live_window() {
        let mut buf = SignalBuffer::new(3);
        buf.slide_push(s(9.0));
        buf.regenerate(&IndexGenerator, &TickWindow::new(0.0, 0.1));
        let xs: Vec<f32> = buf.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_as_bytes_matches_window() {
        let mut buf = SignalBuffer::new(2);
        buf.slide_push(s(1.0));
        buf.slide_push(s(2.0));
        assert_eq!(buf.as_bytes().len(), 16);
        assert_eq!(&buf.as_bytes()[0..4], &1.0f32.to_ne_bytes());
    }
}
