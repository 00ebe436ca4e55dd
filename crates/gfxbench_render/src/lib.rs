//! gfxbench Render System
//!
//! The contract every graphics backend and every benchmark workload
//! satisfies, plus the backends themselves:
//! - `headless`: CPU-only reference backend, no GPU or window required
//! - `wgpu_backend`: DirectX 12, OpenGL, Vulkan and Metal through wgpu

pub mod api;
pub mod backend;
pub mod error;
pub mod headless;
pub mod surface;
pub mod test_case;
pub mod wgpu_backend;
pub mod window;

pub use api::{FrameBuffer, GfxApi, SwapChain};
pub use backend::{create_backend, wgpu_backend_available, BackendOptions};
pub use error::RenderError;
pub use gfxbench_core::{BackendType, TestId};
pub use surface::{Extent, WindowSurface};
pub use test_case::{
    Cubes, StreamingVb, TestCase, VertexPos2, Workload, CUBE_INSTANCE_CHUNK,
    STREAMING_QUAD_CAPACITY, STREAMING_VERTEX_CAPACITY, UNIFORM_BLOCK_TRANSFORMS,
    VERTICES_PER_QUAD,
};
pub use window::{window_attributes, WindowConfig};

pub use wgpu;
pub use winit;
