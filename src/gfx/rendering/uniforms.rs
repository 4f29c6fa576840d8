//! CPU mirrors of the uniform blocks declared in the Phong shaders.
//!
//! Field order and padding follow WGSL uniform layout rules: a `vec3<f32>`
//! takes 16 bytes unless a scalar follows it.

use bytemuck::{Pod, Zeroable};

/// Group 0, binding 0. Written once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection_view_model_xform: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub light_count: u32,
    pub toggle_normal: u32,
    pub _padding: [u32; 3],
}

/// Group 1, binding 0. One per draw, addressed by dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceUniforms {
    pub model_xform: [[f32; 4]; 4],
    pub diffuse_material_colour: [f32; 3],
    pub shininess: f32,
    pub ambient_material_colour: [f32; 3],
    pub use_diff_texture: u32,
    pub specular_colour: [f32; 3],
    pub use_spec_texture: u32,
}

/// Storage array element for `array<vec3<f32>>`, which has a 16 byte stride.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PaddedVec3 {
    pub value: [f32; 3],
    pub _padding: f32,
}

impl From<[f32; 3]> for PaddedVec3 {
    fn from(value: [f32; 3]) -> Self {
        Self {
            value,
            _padding: 0.0,
        }
    }
}

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            projection_view_model_xform: IDENTITY,
            ..Zeroable::zeroed()
        }
    }
}

impl Default for InstanceUniforms {
    fn default() -> Self {
        Self {
            model_xform: IDENTITY,
            ..Zeroable::zeroed()
        }
    }
}
