//! Monotonic clock abstraction
//!
//! The harness never reads wall time directly: it is handed a [`Clock`] and
//! converts raw tick deltas to seconds through it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Tick source used for frame timing.
pub trait Clock {
    /// Current tick count. Never decreases.
    fn read(&self) -> u64;

    /// Converts a tick delta to seconds.
    fn to_secs(&self, ticks: u64) -> f64;
}

/// Wall clock backed by [`Instant`]; one tick is one nanosecond.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn read(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn to_secs(&self, ticks: u64) -> f64 {
        ticks as f64 / 1_000_000_000.0
    }
}

/// Synthetic clock that only moves when told to.
///
/// Clones share the same tick counter, so a test can keep one copy and hand
/// the other to the harness.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ticks: Rc<Cell<u64>>,
    ticks_per_sec: u64,
}

impl ManualClock {
    /// Creates a clock at tick 0 running at `ticks_per_sec`.
    ///
    /// # Panics
    /// Panics if `ticks_per_sec` is zero.
    pub fn new(ticks_per_sec: u64) -> Self {
        assert!(ticks_per_sec > 0, "tick frequency must be non-zero");
        Self {
            ticks: Rc::new(Cell::new(0)),
            ticks_per_sec,
        }
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.set(self.ticks.get() + ticks);
    }

    /// Jumps to an absolute tick. Moving backwards is ignored.
    pub fn set(&self, ticks: u64) {
        if ticks > self.ticks.get() {
            self.ticks.set(ticks);
        }
    }

    pub fn ticks_per_sec(&self) -> u64 {
        self.ticks_per_sec
    }
}

impl Clock for ManualClock {
    fn read(&self) -> u64 {
        self.ticks.get()
    }

    fn to_secs(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_sec as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_ticks() {
        let clock = ManualClock::new(60);
        let handle = clock.clone();

        handle.advance(30);
        assert_eq!(clock.read(), 30);
        assert_eq!(clock.to_secs(clock.read()), 0.5);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(1);
        clock.set(10);
        clock.set(4);
        assert_eq!(clock.read(), 10);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.read();
        let b = clock.read();
        assert!(b >= a);
        assert_eq!(clock.to_secs(1_500_000_000), 1.5);
    }
}
