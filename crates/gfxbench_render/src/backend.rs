//! Backend construction and platform probing

use crate::headless::HeadlessApi;
use crate::wgpu_backend::WgpuApi;
use crate::{BackendType, GfxApi};

/// Options applied to every backend the factory builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendOptions {
    /// Wait for vertical sync on present. Off by default so the frame rate
    /// measures submission cost rather than the display refresh.
    pub vsync: bool,
}

/// Builds an uninitialized backend. The caller (the harness) runs `init`.
pub fn create_backend(backend: BackendType, options: &BackendOptions) -> Box<dyn GfxApi> {
    match backend {
        BackendType::Headless => Box::new(HeadlessApi::new()),
        other => Box::new(WgpuApi::new(other).with_vsync(options.vsync)),
    }
}

/// Whether this build can drive `backend` at all. A `true` here does not
/// guarantee an adapter exists; `GfxApi::init` still decides that.
pub fn wgpu_backend_available(backend: BackendType) -> bool {
    match backend {
        BackendType::DirectX12 => cfg!(target_os = "windows"),
        BackendType::Metal => cfg!(any(target_os = "macos", target_os = "ios")),
        BackendType::Vulkan => !cfg!(any(target_os = "macos", target_os = "ios")),
        BackendType::OpenGl => true,
        BackendType::Headless => false,
    }
}

pub(crate) fn wgpu_backends(backend: BackendType) -> Option<wgpu::Backends> {
    if !wgpu_backend_available(backend) {
        return None;
    }
    match backend {
        BackendType::DirectX12 => Some(wgpu::Backends::DX12),
        BackendType::OpenGl => Some(wgpu::Backends::GL),
        BackendType::Vulkan => Some(wgpu::Backends::VULKAN),
        BackendType::Metal => Some(wgpu::Backends::METAL),
        BackendType::Headless => None,
    }
}
