use crate::BackendType;
use thiserror::Error;

/// Failures reported by backends and test cases.
///
/// None of these are fatal to the process: the harness logs them and
/// either drops the selection or skips the frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0} is not supported on this platform")]
    UnsupportedBackend(BackendType),

    #[error("backend has not been initialized")]
    NotInitialized,

    #[error("no {0} adapter available")]
    AdapterUnavailable(BackendType),

    #[error("failed to create device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("surface is not presentable: {0}")]
    InvalidSurface(&'static str),

    #[error("surface has a zero-sized extent")]
    ZeroExtent,

    #[error("swap chain {0} does not belong to this backend")]
    UnknownSwapChain(u64),

    #[error("frame buffer {0} does not belong to this swap chain")]
    UnknownFrameBuffer(u64),

    #[error("surface acquisition failed: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("{what} capacity exceeded: {requested} requested, {available} available")]
    CapacityExceeded {
        what: &'static str,
        requested: usize,
        available: usize,
    },

    #[error("no frame in progress")]
    NoFrameInProgress,

    #[error("a frame is already in progress")]
    FrameInProgress,
}
