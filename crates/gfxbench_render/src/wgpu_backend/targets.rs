//! Swap chain and frame buffer storage, frame acquisition and presentation

use super::{GpuContext, DEPTH_FORMAT};
use crate::{Extent, FrameBuffer, RenderError, SwapChain};
use std::collections::HashMap;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

pub(crate) struct SwapChainSlot {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
}

pub(crate) struct FrameBufferSlot {
    swap_chain: u64,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

/// Every live presentation target of one device, keyed by handle id.
#[derive(Default)]
pub(crate) struct Targets {
    next_id: u64,
    swap_chains: HashMap<u64, SwapChainSlot>,
    frame_buffers: HashMap<u64, FrameBufferSlot>,
}

/// A frame between `begin` and `end`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenFrame {
    swap_chain: u64,
    frame_buffer: u64,
}

fn create_depth(device: &wgpu::Device, extent: Extent) -> (wgpu::Texture, wgpu::TextureView) {
    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Target"),
        size: wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = depth.create_view(&wgpu::TextureViewDescriptor::default());
    (depth, view)
}

impl Targets {
    pub(crate) fn insert(
        &mut self,
        device: &wgpu::Device,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        extent: Extent,
    ) -> (SwapChain, FrameBuffer) {
        let swap_chain = self.next_id;
        let frame_buffer = self.next_id + 1;
        self.next_id += 2;

        let (depth, depth_view) = create_depth(device, extent);
        self.swap_chains.insert(
            swap_chain,
            SwapChainSlot {
                surface,
                config,
                frame: None,
            },
        );
        self.frame_buffers.insert(
            frame_buffer,
            FrameBufferSlot {
                swap_chain,
                depth,
                depth_view,
            },
        );
        (SwapChain::from_raw(swap_chain), FrameBuffer::from_raw(frame_buffer))
    }

    pub(crate) fn remove_frame_buffer(&mut self, id: u64) {
        if let Some(slot) = self.frame_buffers.remove(&id) {
            slot.depth.destroy();
        }
    }

    pub(crate) fn remove_swap_chain(&mut self, id: u64) {
        if self.frame_buffers.values().any(|fb| fb.swap_chain == id) {
            tracing::warn!(swap_chain = id, "swap chain destroyed before its frame buffer");
            self.frame_buffers.retain(|_, fb| fb.swap_chain != id);
        }
        self.swap_chains.remove(&id);
    }

    /// Resizes if the window changed, then acquires the next surface texture.
    fn acquire(
        &mut self,
        device: &wgpu::Device,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<OpenFrame, RenderError> {
        let sc = self
            .swap_chains
            .get_mut(&swap_chain.id())
            .ok_or(RenderError::UnknownSwapChain(swap_chain.id()))?;
        let fb = self
            .frame_buffers
            .get_mut(&frame_buffer.id())
            .filter(|fb| fb.swap_chain == swap_chain.id())
            .ok_or(RenderError::UnknownFrameBuffer(frame_buffer.id()))?;
        if sc.frame.is_some() {
            return Err(RenderError::FrameInProgress);
        }
        if extent.is_zero() {
            return Err(RenderError::ZeroExtent);
        }

        if sc.config.width != extent.width || sc.config.height != extent.height {
            sc.config.width = extent.width;
            sc.config.height = extent.height;
            sc.surface.configure(device, &sc.config);
            fb.depth.destroy();
            (fb.depth, fb.depth_view) = create_depth(device, extent);
        }

        match sc.surface.get_current_texture() {
            Ok(texture) => {
                sc.frame = Some(texture);
                Ok(OpenFrame {
                    swap_chain: swap_chain.id(),
                    frame_buffer: frame_buffer.id(),
                })
            }
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                sc.surface.configure(device, &sc.config);
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn begin_frame(
    ctx: &GpuContext,
    extent: Extent,
    swap_chain: &SwapChain,
    frame_buffer: &FrameBuffer,
) -> Result<OpenFrame, RenderError> {
    ctx.targets
        .borrow_mut()
        .acquire(&ctx.device, extent, swap_chain, frame_buffer)
}

/// Records one render pass over the acquired frame, submits and presents.
///
/// `record` runs inside the pass; uploads queued before this call land
/// ahead of it on the queue.
pub(crate) fn present_frame<F>(
    ctx: &GpuContext,
    frame: OpenFrame,
    swap_chain: &SwapChain,
    with_depth: bool,
    label: &str,
    record: F,
) -> Result<(), RenderError>
where
    F: FnOnce(&mut wgpu::RenderPass<'_>),
{
    if frame.swap_chain != swap_chain.id() {
        return Err(RenderError::UnknownSwapChain(swap_chain.id()));
    }
    let surface_texture = ctx
        .targets
        .borrow_mut()
        .swap_chains
        .get_mut(&frame.swap_chain)
        .and_then(|sc| sc.frame.take())
        .ok_or(RenderError::NoFrameInProgress)?;
    let view = surface_texture
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let targets = ctx.targets.borrow();
    let depth_view = if with_depth {
        let fb = targets
            .frame_buffers
            .get(&frame.frame_buffer)
            .ok_or(RenderError::UnknownFrameBuffer(frame.frame_buffer))?;
        Some(&fb.depth_view)
    } else {
        None
    };

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: depth_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        record(&mut render_pass);
    }

    ctx.queue.submit(std::iter::once(encoder.finish()));
    surface_texture.present();
    Ok(())
}
