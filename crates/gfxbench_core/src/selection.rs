//! Backend and workload identity tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Graphics backend a harness session can bind.
///
/// "No backend" is expressed as `Option<BackendType>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// DirectX 12 (Windows)
    DirectX12,
    /// OpenGL / GLES (cross-platform)
    #[serde(rename = "opengl")]
    OpenGl,
    /// Vulkan (cross-platform)
    Vulkan,
    /// Metal (macOS, iOS)
    Metal,
    /// CPU-only backend, no GPU or window required
    Headless,
}

impl BackendType {
    pub const ALL: [BackendType; 5] = [
        BackendType::DirectX12,
        BackendType::OpenGl,
        BackendType::Vulkan,
        BackendType::Metal,
        BackendType::Headless,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BackendType::DirectX12 => "DirectX 12",
            BackendType::OpenGl => "OpenGL",
            BackendType::Vulkan => "Vulkan",
            BackendType::Metal => "Metal",
            BackendType::Headless => "Headless",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Benchmark workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestId {
    /// One quad per draw call appended to a streaming vertex buffer
    StreamingVb,
    /// Instanced cubes driven by uniform buffer updates
    CubesUniform,
    /// Instanced cubes driven by a dynamically rewritten instance buffer
    #[default]
    CubesDynamicBuffer,
}

impl TestId {
    pub const ALL: [TestId; 3] = [
        TestId::StreamingVb,
        TestId::CubesUniform,
        TestId::CubesDynamicBuffer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TestId::StreamingVb => "StreamingVB",
            TestId::CubesUniform => "CubesUniform",
            TestId::CubesDynamicBuffer => "CubesDynamicBuffer",
        }
    }

    /// Whether the workload consumes the shared cube transform batch.
    pub fn is_cubes(self) -> bool {
        matches!(self, TestId::CubesUniform | TestId::CubesDynamicBuffer)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
