//! Graphics device abstraction
//!
//! The frame renderer talks to the GPU only through [`RenderDevice`]. Resources
//! are referred to by small copyable handles; the device owns the real objects.
//! The command model is immediate: state set with [`RenderDevice::set_uniform`]
//! and [`RenderDevice::bind_texture`] applies to every following draw until it
//! is changed again.

use crate::{
    error::GpuError,
    gfx::shader_interface::{TextureUnit, Uniform},
    imaging::DecodedImage,
};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// A vertex or index buffer.
    BufferId
);
handle!(
    /// Vertex buffers bound to attribute slots plus an index buffer.
    VertexLayoutId
);
handle!(
    /// A sampled 2D texture with its sampler.
    TextureId
);
handle!(
    /// A linked vertex/fragment shader program.
    ProgramId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// One vertex buffer feeding one attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub slot: u32,
    pub format: wgpu::VertexFormat,
    pub buffer: BufferId,
}

/// Filtering and wrapping for a texture, and whether to build its mip chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    pub mipmap_filter: wgpu::FilterMode,
    pub address_mode_u: wgpu::AddressMode,
    pub address_mode_v: wgpu::AddressMode,
    pub generate_mipmaps: bool,
}

impl Default for SamplerSettings {
    /// Trilinear filtering with repeat wrapping.
    fn default() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            generate_mipmaps: true,
        }
    }
}

/// Shader sources for one program. Entry points are `vs_main` and `fs_main`.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub colour: [f32; 4],
    pub depth: f32,
}

/// A value uploaded to a [`Uniform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    /// Column-major.
    Mat4([[f32; 4]; 4]),
    Vec3Array(&'a [[f32; 3]]),
    FloatArray(&'a [f32]),
}

impl UniformValue<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            UniformValue::Bool(_) => "bool",
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Vec3Array(_) => "vec3[]",
            UniformValue::FloatArray(_) => "float[]",
        }
    }
}

/// The operations the frame renderer needs from a GPU.
///
/// Creation happens during startup, release during teardown; everything
/// between [`begin_frame`](Self::begin_frame) and [`end_frame`](Self::end_frame)
/// only reads existing resources.
pub trait RenderDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferId, GpuError>;

    fn create_vertex_layout(
        &mut self,
        label: &str,
        bindings: &[VertexBinding],
        index_buffer: BufferId,
    ) -> Result<VertexLayoutId, GpuError>;

    fn create_texture(
        &mut self,
        label: &str,
        image: &DecodedImage,
        sampler: &SamplerSettings,
    ) -> Result<TextureId, GpuError>;

    /// Compiles and links a program, failing with
    /// [`GpuError::ShaderCompilation`] if either stage is rejected.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError>;

    fn release_buffer(&mut self, id: BufferId);
    fn release_vertex_layout(&mut self, id: VertexLayoutId);
    fn release_texture(&mut self, id: TextureId);
    fn release_program(&mut self, id: ProgramId);

    fn set_viewport(&mut self, width: u32, height: u32);

    fn begin_frame(&mut self, clear: &ClearState) -> Result<(), GpuError>;
    fn use_program(&mut self, id: ProgramId) -> Result<(), GpuError>;
    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) -> Result<(), GpuError>;
    /// Binds `texture` to `unit`; `None` unbinds it.
    fn bind_texture(&mut self, unit: TextureUnit, texture: Option<TextureId>)
        -> Result<(), GpuError>;
    fn draw_indexed(&mut self, layout: VertexLayoutId, index_count: u32) -> Result<(), GpuError>;
    /// Submits the frame and presents it.
    fn end_frame(&mut self) -> Result<(), GpuError>;
}
