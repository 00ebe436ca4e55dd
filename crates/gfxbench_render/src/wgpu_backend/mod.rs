//! wgpu-backed implementations
//!
//! One [`WgpuApi`] type serves every native API: the [`BackendType`] picks
//! which `wgpu::Backends` the instance is restricted to, so a DirectX 12
//! session and an OpenGL session run the same workload code against
//! different drivers.

mod cubes;
mod shaders;
mod streaming_vb;
mod targets;

use crate::backend::wgpu_backends;
use crate::{
    BackendType, FrameBuffer, GfxApi, RenderError, SwapChain, TestId, WindowSurface, Workload,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cubes::{CubesPath, WgpuCubes};
use streaming_vb::WgpuStreamingVb;
use targets::Targets;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device objects shared by the backend and its test cases.
pub(crate) struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) targets: RefCell<Targets>,
    /// Color format of the most recently created swap chain.
    pub(crate) color_format: Cell<Option<wgpu::TextureFormat>>,
}

impl GpuContext {
    pub(crate) fn color_format(&self) -> Result<wgpu::TextureFormat, RenderError> {
        self.color_format
            .get()
            .ok_or(RenderError::InvalidSurface("no swap chain has been created"))
    }
}

pub struct WgpuApi {
    backend: BackendType,
    vsync: bool,
    context: Option<Rc<GpuContext>>,
}

impl WgpuApi {
    pub fn new(backend: BackendType) -> Self {
        Self {
            backend,
            vsync: false,
            context: None,
        }
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Adapter description, once initialized.
    pub fn adapter_info(&self) -> Option<wgpu::AdapterInfo> {
        self.context.as_ref().map(|ctx| ctx.adapter.get_info())
    }

    async fn request_context(&self, backends: wgpu::Backends) -> Result<GpuContext, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterUnavailable(self.backend))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("gfxbench device"),
                    required_features: wgpu::Features::empty(),
                    // Whatever the adapter offers; workloads stay inside downlevel limits.
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        Ok(GpuContext {
            instance,
            adapter,
            device,
            queue,
            targets: RefCell::new(Targets::default()),
            color_format: Cell::new(None),
        })
    }
}

impl GfxApi for WgpuApi {
    fn backend_type(&self) -> BackendType {
        self.backend
    }

    fn init(&mut self) -> Result<(), RenderError> {
        let backends =
            wgpu_backends(self.backend).ok_or(RenderError::UnsupportedBackend(self.backend))?;
        let context = pollster::block_on(self.request_context(backends))?;

        let info = context.adapter.get_info();
        tracing::info!(
            backend = %self.backend,
            adapter = %info.name,
            driver = %info.driver,
            "device created"
        );
        self.context = Some(Rc::new(context));
        Ok(())
    }

    fn create_swap_chain(
        &mut self,
        surface: &WindowSurface,
    ) -> Result<(SwapChain, FrameBuffer), RenderError> {
        let ctx = self.context.as_ref().ok_or(RenderError::NotInitialized)?;
        let window = surface
            .window()
            .ok_or(RenderError::InvalidSurface("no native window"))?;
        let extent = surface.extent();
        if extent.is_zero() {
            return Err(RenderError::ZeroExtent);
        }

        let wgpu_surface = ctx.instance.create_surface(window.clone())?;
        let caps = wgpu_surface.get_capabilities(&ctx.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::InvalidSurface("adapter cannot present to this window"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: extent.width,
            height: extent.height,
            present_mode: if self.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        wgpu_surface.configure(&ctx.device, &config);
        ctx.color_format.set(Some(format));

        let (swap_chain, frame_buffer) =
            ctx.targets
                .borrow_mut()
                .insert(&ctx.device, wgpu_surface, config, extent);
        tracing::debug!(?format, width = extent.width, height = extent.height, "swap chain created");
        Ok((swap_chain, frame_buffer))
    }

    fn destroy_frame_buffer(&mut self, frame_buffer: FrameBuffer) {
        if let Some(ctx) = &self.context {
            ctx.targets.borrow_mut().remove_frame_buffer(frame_buffer.id());
        }
    }

    fn destroy_swap_chain(&mut self, swap_chain: SwapChain) {
        if let Some(ctx) = &self.context {
            ctx.targets.borrow_mut().remove_swap_chain(swap_chain.id());
        }
    }

    fn create_test(&mut self, id: TestId) -> Option<Workload> {
        let Some(ctx) = &self.context else {
            tracing::warn!(test = %id, "test requested before the device was created");
            return None;
        };
        let ctx = Rc::clone(ctx);
        let workload = match id {
            TestId::StreamingVb => Workload::StreamingVb(Box::new(WgpuStreamingVb::new(ctx))),
            TestId::CubesUniform => {
                Workload::CubesUniform(Box::new(WgpuCubes::new(ctx, CubesPath::Uniform)))
            }
            TestId::CubesDynamicBuffer => Workload::CubesDynamicBuffer(Box::new(WgpuCubes::new(
                ctx,
                CubesPath::DynamicBuffer,
            ))),
        };
        Some(workload)
    }
}
