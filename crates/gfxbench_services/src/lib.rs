//! gfxbench Services Layer
//!
//! Everything the harness reads from outside the process: the settings
//! file and the switch requests produced by keyboard input.

pub mod input;
pub mod settings;

pub use input::{Key, Request, RequestQueue};
pub use settings::{BenchmarkSettings, Settings, SettingsError, WindowSettings};
