//! gfxbench Metrics - frame rate reporting and session counters
//!
//! The FPS counter is always available: it is the harness's primary output.
//! Named session counters are a debugging aid that completely vanishes
//! without the `metrics` feature.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable session counters (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use gfxbench_core::time::SystemClock;
//! use gfxbench_metrics::FpsCounter;
//!
//! let clock = SystemClock::new();
//! let mut fps = FpsCounter::new(&clock);
//! loop {
//!     // ... render ...
//!     if let Some(value) = fps.record_frame(&clock) {
//!         println!("FPS: {value}");
//!     }
//! }
//! ```

mod fps;
mod ring_buffer;
#[cfg(feature = "metrics")]
mod counter;

pub use fps::{FpsCounter, FPS_HISTORY};
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use counter::Counter;

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn reset_all(&mut self) {}
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_counter_api_compiles_either_way() {
        let mut counter = super::Counter::new();
        counter.increment("frames_presented", 1);
        let _ = counter.get("frames_presented");
        counter.reset_all();
    }
}
