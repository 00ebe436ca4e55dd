//! Benchmark workload contracts
//!
//! Every workload shares the `init` / `begin` / `end` lifecycle of
//! [`TestCase`]; the submission entry point differs per workload and is
//! reached through the [`Workload`] tag rather than by inspecting the
//! concrete type.

use crate::{Extent, FrameBuffer, RenderError, SwapChain, TestId};
use glam::Mat4;

/// Vertices per streamed quad (two triangles, no index buffer).
pub const VERTICES_PER_QUAD: usize = 6;

/// Quads the streaming workload can accept in one frame.
pub const STREAMING_QUAD_CAPACITY: usize = 160_000;

pub const STREAMING_VERTEX_CAPACITY: usize = STREAMING_QUAD_CAPACITY * VERTICES_PER_QUAD;

/// Transforms per uniform block (16 KiB, the downlevel uniform binding limit).
pub const UNIFORM_BLOCK_TRANSFORMS: usize = 256;

/// Instances written to the dynamic instance buffer per upload.
pub const CUBE_INSTANCE_CHUNK: usize = 4096;

/// 2D position-only vertex used by the streaming workload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPos2 {
    pub x: f32,
    pub y: f32,
}

impl VertexPos2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Lifecycle shared by every workload.
///
/// GPU resources are created in `init` and released when the test case is
/// dropped. A test case must not outlive the backend that created it.
pub trait TestCase {
    /// Allocates resources sized for the workload's maximum draw volume.
    fn init(&mut self) -> Result<(), RenderError>;

    /// Prepares a frame (acquire, clear, bind targets). On failure the frame
    /// is abandoned: no submissions and no `end` follow.
    fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError>;

    /// Finalizes and presents the frame opened by `begin`.
    fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError>;
}

/// Streams one small vertex batch per call into a CPU-to-GPU buffer.
pub trait StreamingVb: TestCase {
    fn draw(&mut self, vertices: &[VertexPos2]) -> Result<(), RenderError>;
}

/// Renders one cube instance per transform.
pub trait Cubes: TestCase {
    fn draw(&mut self, transforms: &[Mat4]) -> Result<(), RenderError>;
}

/// A test case tagged with its workload, so the harness can call the
/// matching submission path directly.
pub enum Workload {
    StreamingVb(Box<dyn StreamingVb>),
    CubesUniform(Box<dyn Cubes>),
    CubesDynamicBuffer(Box<dyn Cubes>),
}

impl Workload {
    pub fn id(&self) -> TestId {
        match self {
            Workload::StreamingVb(_) => TestId::StreamingVb,
            Workload::CubesUniform(_) => TestId::CubesUniform,
            Workload::CubesDynamicBuffer(_) => TestId::CubesDynamicBuffer,
        }
    }

    pub fn init(&mut self) -> Result<(), RenderError> {
        match self {
            Workload::StreamingVb(test) => test.init(),
            Workload::CubesUniform(test) | Workload::CubesDynamicBuffer(test) => test.init(),
        }
    }

    pub fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        match self {
            Workload::StreamingVb(test) => test.begin(extent, swap_chain, frame_buffer),
            Workload::CubesUniform(test) | Workload::CubesDynamicBuffer(test) => {
                test.begin(extent, swap_chain, frame_buffer)
            }
        }
    }

    pub fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError> {
        match self {
            Workload::StreamingVb(test) => test.end(swap_chain),
            Workload::CubesUniform(test) | Workload::CubesDynamicBuffer(test) => {
                test.end(swap_chain)
            }
        }
    }
}

impl std::fmt::Debug for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Workload").field(&self.id()).finish()
    }
}
