//! Ring buffer for rolling averages of reported frame rates

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    index: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    /// Pushes a sample, overwriting the oldest one once full.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        let last = (self.index + self.capacity - 1) % self.capacity;
        self.samples.get(last).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl RingBuffer<f64> {
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let sum: f64 = self.samples.iter().sum();
        sum / self.samples.len() as f64
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer() {
        let mut buffer = RingBuffer::new(3);
        assert_eq!(buffer.latest(), None);
        assert_eq!(buffer.min_max(), None);

        buffer.push(10.0);
        assert_eq!(buffer.average(), 10.0);

        buffer.push(20.0);
        assert_eq!(buffer.average(), 15.0);

        buffer.push(30.0);
        assert_eq!(buffer.average(), 20.0);

        // Should wrap around
        buffer.push(40.0);
        assert_eq!(buffer.average(), 30.0); // (20 + 30 + 40) / 3
        assert_eq!(buffer.latest(), Some(40.0));
        assert_eq!(buffer.min_max(), Some((20.0, 40.0)));
        assert_eq!(buffer.len(), 3);
    }
}
