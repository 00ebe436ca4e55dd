use super::shaders;
use super::targets::{begin_frame, present_frame, OpenFrame};
use super::GpuContext;
use crate::{
    Extent, FrameBuffer, RenderError, StreamingVb, SwapChain, TestCase, VertexPos2,
    STREAMING_VERTEX_CAPACITY,
};
use std::rc::Rc;

const VERTEX_SIZE: wgpu::BufferAddress = std::mem::size_of::<VertexPos2>() as wgpu::BufferAddress;

struct StreamingResources {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    screen_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Uploads every quad with its own queue write at a running cursor, then
/// draws the whole buffer once at `end`.
pub(crate) struct WgpuStreamingVb {
    ctx: Rc<GpuContext>,
    resources: Option<StreamingResources>,
    frame: Option<OpenFrame>,
    written: usize,
}

impl WgpuStreamingVb {
    pub(crate) fn new(ctx: Rc<GpuContext>) -> Self {
        Self {
            ctx,
            resources: None,
            frame: None,
            written: 0,
        }
    }

    fn create_resources(&self) -> Result<StreamingResources, RenderError> {
        let device = &self.ctx.device;
        let format = self.ctx.color_format()?;
        let shader = shaders::create_module(device, "Streaming VB Shader", shaders::STREAMING_VB);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Streaming VB Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(16),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Streaming VB Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Streaming VB Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: VERTEX_SIZE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Sized for the heaviest frame the harness submits.
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Streaming Vertex Buffer"),
            size: STREAMING_VERTEX_CAPACITY as wgpu::BufferAddress * VERTEX_SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let screen_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screen Uniform"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Streaming VB Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        Ok(StreamingResources {
            pipeline,
            vertex_buffer,
            screen_buffer,
            bind_group,
        })
    }
}

impl TestCase for WgpuStreamingVb {
    fn init(&mut self) -> Result<(), RenderError> {
        self.resources = Some(self.create_resources()?);
        Ok(())
    }

    fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        let res = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        let frame = begin_frame(&self.ctx, extent, swap_chain, frame_buffer)?;

        let screen = [extent.width as f32, extent.height as f32, 0.0, 0.0];
        self.ctx
            .queue
            .write_buffer(&res.screen_buffer, 0, bytemuck::cast_slice(&screen));
        self.frame = Some(frame);
        self.written = 0;
        Ok(())
    }

    fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NoFrameInProgress)?;
        let res = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        let count = self.written as u32;

        present_frame(&self.ctx, frame, swap_chain, false, "Streaming VB Pass", |pass| {
            if count == 0 {
                return;
            }
            pass.set_pipeline(&res.pipeline);
            pass.set_bind_group(0, &res.bind_group, &[]);
            pass.set_vertex_buffer(0, res.vertex_buffer.slice(..count as u64 * VERTEX_SIZE));
            pass.draw(0..count, 0..1);
        })
    }
}

impl StreamingVb for WgpuStreamingVb {
    fn draw(&mut self, vertices: &[VertexPos2]) -> Result<(), RenderError> {
        if self.frame.is_none() {
            return Err(RenderError::NoFrameInProgress);
        }
        let res = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        if vertices.is_empty() {
            return Ok(());
        }
        let available = STREAMING_VERTEX_CAPACITY - self.written;
        if vertices.len() > available {
            return Err(RenderError::CapacityExceeded {
                what: "streaming vertex buffer",
                requested: vertices.len(),
                available,
            });
        }

        let offset = self.written as wgpu::BufferAddress * VERTEX_SIZE;
        self.ctx
            .queue
            .write_buffer(&res.vertex_buffer, offset, bytemuck::cast_slice(vertices));
        self.written += vertices.len();
        Ok(())
    }
}
