//! gfxbench Core
//!
//! Backend-independent building blocks shared by every harness crate:
//! - Backend and test identity tags
//! - Injected monotonic clock
//! - Math (glam re-export, cube transform batch)

pub mod math;
pub mod selection;
pub mod time;

pub use glam;
pub use selection::{BackendType, TestId};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
