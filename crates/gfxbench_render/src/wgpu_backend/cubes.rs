use super::shaders;
use super::targets::{begin_frame, present_frame, OpenFrame};
use super::{GpuContext, DEPTH_FORMAT};
use crate::{
    Cubes, Extent, FrameBuffer, RenderError, SwapChain, TestCase, CUBE_INSTANCE_CHUNK,
    UNIFORM_BLOCK_TRANSFORMS,
};
use gfxbench_core::math::CUBE_COUNT;
use glam::{Mat4, Vec3};
use std::rc::Rc;
use wgpu::util::DeviceExt;

const MAT4_SIZE: wgpu::BufferAddress = std::mem::size_of::<Mat4>() as wgpu::BufferAddress;
const BLOCK_SIZE: wgpu::BufferAddress = UNIFORM_BLOCK_TRANSFORMS as wgpu::BufferAddress * MAT4_SIZE;
const BLOCK_COUNT: usize = CUBE_COUNT / UNIFORM_BLOCK_TRANSFORMS;
const INDEX_COUNT: u32 = 36;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CubeVertex {
    position: [f32; 3],
}

const fn corner(x: f32, y: f32, z: f32) -> CubeVertex {
    CubeVertex {
        position: [x * 0.4, y * 0.4, z * 0.4],
    }
}

const CUBE_VERTICES: [CubeVertex; 8] = [
    corner(-1.0, -1.0, -1.0),
    corner(1.0, -1.0, -1.0),
    corner(1.0, 1.0, -1.0),
    corner(-1.0, 1.0, -1.0),
    corner(-1.0, -1.0, 1.0),
    corner(1.0, -1.0, 1.0),
    corner(1.0, 1.0, 1.0),
    corner(-1.0, 1.0, 1.0),
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; INDEX_COUNT as usize] = [
    4, 5, 6, 6, 7, 4, // +z
    1, 0, 3, 3, 2, 1, // -z
    5, 1, 2, 2, 6, 5, // +x
    0, 4, 7, 7, 3, 0, // -x
    7, 6, 2, 2, 3, 7, // +y
    0, 1, 5, 5, 4, 0, // -y
];

/// Which buffer carries the per-instance transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CubesPath {
    /// 256-transform uniform blocks selected with a dynamic offset.
    Uniform,
    /// Instance-rate vertex buffer rewritten chunk by chunk.
    DynamicBuffer,
}

struct CubeResources {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    /// Uniform blocks or instance data, depending on the path.
    transform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// One batch queued for the pass recorded in `end`.
#[derive(Debug, Clone, Copy)]
struct Batch {
    offset: wgpu::BufferAddress,
    count: u32,
}

pub(crate) struct WgpuCubes {
    ctx: Rc<GpuContext>,
    path: CubesPath,
    resources: Option<CubeResources>,
    frame: Option<OpenFrame>,
    batches: Vec<Batch>,
    /// Bytes of `transform_buffer` claimed this frame.
    cursor: wgpu::BufferAddress,
}

fn view_projection(extent: Extent) -> Mat4 {
    let projection = Mat4::perspective_rh(60f32.to_radians(), extent.aspect(), 0.1, 500.0);
    let view = Mat4::look_at_rh(Vec3::new(70.0, 55.0, 110.0), Vec3::ZERO, Vec3::Y);
    projection * view
}

impl WgpuCubes {
    pub(crate) fn new(ctx: Rc<GpuContext>, path: CubesPath) -> Self {
        Self {
            ctx,
            path,
            resources: None,
            frame: None,
            batches: Vec::new(),
            cursor: 0,
        }
    }

    fn transform_buffer_size() -> wgpu::BufferAddress {
        CUBE_COUNT as wgpu::BufferAddress * MAT4_SIZE
    }

    fn create_resources(&self) -> Result<CubeResources, RenderError> {
        let device = &self.ctx.device;
        let format = self.ctx.color_format()?;

        let (label, source, usage) = match self.path {
            CubesPath::Uniform => (
                "Cubes Uniform",
                shaders::CUBES_UNIFORM,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            ),
            CubesPath::DynamicBuffer => (
                "Cubes Dynamic Buffer",
                shaders::CUBES_INSTANCED,
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            ),
        };
        let shader = shaders::create_module(device, label, source);

        let camera_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(MAT4_SIZE),
            },
            count: None,
        };
        let block_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(BLOCK_SIZE),
            },
            count: None,
        };
        let layout_entries = match self.path {
            CubesPath::Uniform => vec![camera_entry, block_entry],
            CubesPath::DynamicBuffer => vec![camera_entry],
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &layout_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let cube_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        };
        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: MAT4_SIZE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![
                1 => Float32x4,
                2 => Float32x4,
                3 => Float32x4,
                4 => Float32x4
            ],
        };
        let buffers = match self.path {
            CubesPath::Uniform => vec![cube_layout],
            CubesPath::DynamicBuffer => vec![cube_layout, instance_layout],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &buffers,
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
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertices"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Indices"),
            contents: bytemuck::cast_slice(&CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform"),
            size: MAT4_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Room for the full 64^3 batch every frame.
        let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cube Transforms"),
            size: Self::transform_buffer_size(),
            usage,
            mapped_at_creation: false,
        });

        let bind_group = match self.path {
            CubesPath::Uniform => device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &transform_buffer,
                            offset: 0,
                            size: wgpu::BufferSize::new(BLOCK_SIZE),
                        }),
                    },
                ],
            }),
            CubesPath::DynamicBuffer => device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            }),
        };

        Ok(CubeResources {
            pipeline,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            transform_buffer,
            bind_group,
        })
    }

    /// Splits `transforms` into batches, uploading each one as it goes.
    fn upload(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        let res = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        let batch_len = match self.path {
            CubesPath::Uniform => UNIFORM_BLOCK_TRANSFORMS,
            CubesPath::DynamicBuffer => CUBE_INSTANCE_CHUNK,
        };

        // Uniform blocks are bound at fixed block-sized offsets, so every
        // batch there claims a whole block even when it is short.
        let needed: wgpu::BufferAddress = match self.path {
            CubesPath::Uniform => transforms.len().div_ceil(batch_len) as wgpu::BufferAddress * BLOCK_SIZE,
            CubesPath::DynamicBuffer => transforms.len() as wgpu::BufferAddress * MAT4_SIZE,
        };
        let available = Self::transform_buffer_size() - self.cursor;
        if needed > available {
            return Err(RenderError::CapacityExceeded {
                what: "cube transform buffer",
                requested: transforms.len(),
                available: (available / MAT4_SIZE) as usize,
            });
        }

        for batch in transforms.chunks(batch_len) {
            self.ctx
                .queue
                .write_buffer(&res.transform_buffer, self.cursor, bytemuck::cast_slice(batch));
            self.batches.push(Batch {
                offset: self.cursor,
                count: batch.len() as u32,
            });
            self.cursor += match self.path {
                CubesPath::Uniform => BLOCK_SIZE,
                CubesPath::DynamicBuffer => std::mem::size_of_val(batch) as wgpu::BufferAddress,
            };
        }
        Ok(())
    }
}

impl TestCase for WgpuCubes {
    fn init(&mut self) -> Result<(), RenderError> {
        self.resources = Some(self.create_resources()?);
        self.batches = Vec::with_capacity(BLOCK_COUNT);
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

        let view_proj = view_projection(extent);
        self.ctx
            .queue
            .write_buffer(&res.camera_buffer, 0, bytemuck::bytes_of(&view_proj));
        self.frame = Some(frame);
        self.batches.clear();
        self.cursor = 0;
        Ok(())
    }

    fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NoFrameInProgress)?;
        let res = self.resources.as_ref().ok_or(RenderError::NotInitialized)?;
        let path = self.path;
        let batches = &self.batches;

        present_frame(&self.ctx, frame, swap_chain, true, "Cubes Pass", |pass| {
            pass.set_pipeline(&res.pipeline);
            pass.set_vertex_buffer(0, res.vertex_buffer.slice(..));
            pass.set_index_buffer(res.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            if path == CubesPath::DynamicBuffer {
                pass.set_bind_group(0, &res.bind_group, &[]);
            }

            for batch in batches {
                match path {
                    CubesPath::Uniform => {
                        pass.set_bind_group(0, &res.bind_group, &[batch.offset as wgpu::DynamicOffset]);
                    }
                    CubesPath::DynamicBuffer => {
                        let end = batch.offset + batch.count as wgpu::BufferAddress * MAT4_SIZE;
                        pass.set_vertex_buffer(1, res.transform_buffer.slice(batch.offset..end));
                    }
                }
                pass.draw_indexed(0..INDEX_COUNT, 0, 0..batch.count);
            }
        })
    }
}

impl Cubes for WgpuCubes {
    fn draw(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        if self.frame.is_none() {
            return Err(RenderError::NoFrameInProgress);
        }
        self.upload(transforms)
    }
}
