//! Frames-per-second reporting

use super::ring_buffer::RingBuffer;
use gfxbench_core::time::Clock;

/// Number of past reports kept for the session summary.
pub const FPS_HISTORY: usize = 60;

/// Counts frames and reports the rate once at least one second has elapsed.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_count: u32,
    last_report: u64,
    history: RingBuffer<f64>,
}

impl FpsCounter {
    /// Starts the first reporting interval at the clock's current tick.
    pub fn new<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::starting_at(clock.read())
    }

    pub fn starting_at(ticks: u64) -> Self {
        Self {
            frame_count: 0,
            last_report: ticks,
            history: RingBuffer::new(FPS_HISTORY),
        }
    }

    /// Records one completed frame.
    ///
    /// Returns `Some(frames / elapsed_secs)` when the interval since the last
    /// report reaches one second; both the frame count and the interval
    /// start are reset at that point.
    pub fn record_frame<C: Clock + ?Sized>(&mut self, clock: &C) -> Option<f64> {
        self.frame_count += 1;

        let now = clock.read();
        let elapsed = clock.to_secs(now.saturating_sub(self.last_report));
        if elapsed < 1.0 {
            return None;
        }

        let fps = self.frame_count as f64 / elapsed;
        self.frame_count = 0;
        self.last_report = now;
        self.history.push(fps);
        Some(fps)
    }

    /// Drops the frames counted so far and starts a new interval at `ticks`.
    /// Past reports are kept.
    pub fn restart(&mut self, ticks: u64) {
        self.frame_count = 0;
        self.last_report = ticks;
    }

    /// Frames recorded since the last report.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Number of reports emitted so far, capped at [`FPS_HISTORY`].
    pub fn reports(&self) -> usize {
        self.history.len()
    }

    pub fn latest(&self) -> Option<f64> {
        self.history.latest()
    }

    /// Mean of the retained reports, 0.0 before the first one.
    pub fn average(&self) -> f64 {
        self.history.average()
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.history.min_max()
    }
}
