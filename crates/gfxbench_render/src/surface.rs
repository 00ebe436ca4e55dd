//! Presentable surface description handed to backends

use std::sync::Arc;
use winit::window::Window;

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for Extent {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// The host window as seen by a backend: an optional native window plus
/// its current pixel extent.
///
/// The harness never creates or manages the window; it only forwards this
/// description to `GfxApi::create_swap_chain` and the current extent to
/// every `TestCase::begin`.
#[derive(Debug, Clone)]
pub struct WindowSurface {
    window: Option<Arc<Window>>,
    extent: Extent,
}

impl WindowSurface {
    pub fn from_window(window: Arc<Window>) -> Self {
        let extent = window.inner_size().into();
        Self {
            window: Some(window),
            extent,
        }
    }

    /// A surface with no native window. Only the headless backend can
    /// present to it.
    pub fn headless(extent: Extent) -> Self {
        Self {
            window: None,
            extent,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Extent) {
        self.extent = extent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_surface_tracks_resizes() {
        let mut surface = WindowSurface::headless(Extent::new(1024, 748));
        assert!(surface.window().is_none());
        assert_eq!(surface.extent(), Extent::new(1024, 748));

        surface.set_extent(Extent::new(0, 748));
        assert!(surface.extent().is_zero());
        assert_eq!(surface.extent().aspect(), 0.0);
    }
}
