//! Window creation
//!
//! winit 0.30 only creates windows from inside `ApplicationHandler::resumed`,
//! so this module just turns a placement into attributes for that call.

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::window::{Window, WindowAttributes};

/// Placement of the benchmark window, in physical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Test Window".to_string(),
            x: 50,
            y: 50,
            width: 1024,
            height: 748,
        }
    }
}

pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_position(PhysicalPosition::new(config.x, config.y))
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        // The benchmark does not cope with a zero-sized swap chain.
        .with_min_inner_size(PhysicalSize::new(1u32, 1u32))
}
