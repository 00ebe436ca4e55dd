//! WGSL sources for the workloads

/// Quads in window pixel space; (0, 0) is the top-left corner.
pub(crate) const STREAMING_VB: &str = r#"
struct Screen {
    size: vec4<f32>,
};

@group(0) @binding(0) var<uniform> screen: Screen;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    let ndc = vec2<f32>(
        position.x / screen.size.x * 2.0 - 1.0,
        1.0 - position.y / screen.size.y * 2.0,
    );
    return vec4<f32>(ndc, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(0.9, 0.5, 0.1, 1.0);
}
"#;

/// Per-instance model matrices read from a 256-entry uniform block.
pub(crate) const CUBES_UNIFORM: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct Block {
    models: array<mat4x4<f32>, 256>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> block: Block;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @builtin(instance_index) instance: u32,
) -> VsOut {
    let world = block.models[instance] * vec4<f32>(position, 1.0);
    var out: VsOut;
    out.clip = camera.view_proj * world;
    out.color = position + vec3<f32>(0.5);
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Per-instance model matrices streamed as four vec4 vertex attributes.
pub(crate) const CUBES_INSTANCED: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
) -> VsOut {
    let model = mat4x4<f32>(model_0, model_1, model_2, model_3);
    var out: VsOut;
    out.clip = camera.view_proj * model * vec4<f32>(position, 1.0);
    out.color = position + vec3<f32>(0.5);
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

pub(crate) fn create_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}
