//! Backend abstraction
//!
//! A backend owns its device and every swap chain and frame buffer it hands
//! out. Handles are opaque ids; the resources behind them stay inside the
//! backend and are released only through the matching `destroy_*` call.

use crate::{BackendType, RenderError, TestId, WindowSurface, Workload};

/// Presentable surface handle issued by a [`GfxApi`].
///
/// Not `Clone`: destroying it consumes the only handle.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SwapChain(u64);

impl SwapChain {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Render target bound 1:1 to a [`SwapChain`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FrameBuffer(u64);

impl FrameBuffer {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One concrete graphics implementation.
pub trait GfxApi {
    fn backend_type(&self) -> BackendType;

    /// Establishes the device. A failed init leaves nothing to clean up
    /// beyond dropping the backend.
    fn init(&mut self) -> Result<(), RenderError>;

    /// Binds a presentable surface sized to the window's current extent.
    fn create_swap_chain(
        &mut self,
        surface: &WindowSurface,
    ) -> Result<(SwapChain, FrameBuffer), RenderError>;

    /// Must be called before the owning swap chain is destroyed.
    fn destroy_frame_buffer(&mut self, frame_buffer: FrameBuffer);

    fn destroy_swap_chain(&mut self, swap_chain: SwapChain);

    /// Creates an uninitialized test case, or `None` when this backend
    /// cannot run `id`. The caller must call `init` on the result.
    fn create_test(&mut self, id: TestId) -> Option<Workload>;
}
