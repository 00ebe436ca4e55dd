//! gfxbench Runtime
//!
//! The [`Harness`] that binds backends and tests, and the per-frame
//! workload drivers it runs.

pub mod harness;
pub mod workload;

#[cfg(test)]
mod mock;

pub use harness::{
    BackendFactory, Flow, FpsSummary, FrameOutcome, Harness, HarnessError, HarnessState,
};
pub use workload::{QuadGrid, Submission};
