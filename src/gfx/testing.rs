//! A [`RenderDevice`] that records every call instead of talking to a GPU.

use std::collections::HashSet;

use crate::{
    error::GpuError,
    gfx::{
        device::{
            BufferId, BufferKind, ClearState, ProgramId, ProgramSource, RenderDevice,
            SamplerSettings, TextureId, UniformValue, VertexBinding, VertexLayoutId,
        },
        shader_interface::{TextureUnit, Uniform},
    },
    imaging::DecodedImage,
};

/// Owned copy of a [`UniformValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Mat4([[f32; 4]; 4]),
    Vec3Array(Vec<[f32; 3]>),
    FloatArray(Vec<f32>),
}

impl From<UniformValue<'_>> for Recorded {
    fn from(value: UniformValue<'_>) -> Self {
        match value {
            UniformValue::Bool(v) => Recorded::Bool(v),
            UniformValue::Int(v) => Recorded::Int(v),
            UniformValue::Float(v) => Recorded::Float(v),
            UniformValue::Vec3(v) => Recorded::Vec3(v),
            UniformValue::Mat4(v) => Recorded::Mat4(v),
            UniformValue::Vec3Array(v) => Recorded::Vec3Array(v.to_vec()),
            UniformValue::FloatArray(v) => Recorded::FloatArray(v.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer {
        id: BufferId,
        label: String,
        kind: BufferKind,
        len: usize,
    },
    CreateVertexLayout {
        id: VertexLayoutId,
        bindings: Vec<VertexBinding>,
        index_buffer: BufferId,
    },
    CreateTexture {
        id: TextureId,
        label: String,
    },
    CreateProgram {
        id: ProgramId,
        label: String,
    },
    SetViewport(u32, u32),
    BeginFrame,
    UseProgram(ProgramId),
    SetUniform(Uniform, Recorded),
    BindTexture(TextureUnit, Option<TextureId>),
    DrawIndexed {
        layout: VertexLayoutId,
        index_count: u32,
    },
    EndFrame,
}

/// Uniform and texture state in effect when a draw was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSnapshot {
    pub layout: VertexLayoutId,
    pub index_count: u32,
    pub uniforms: Vec<(Uniform, Recorded)>,
    pub textures: [Option<TextureId>; 2],
}

impl DrawSnapshot {
    pub fn uniform(&self, uniform: Uniform) -> Option<&Recorded> {
        self.uniforms
            .iter()
            .find(|(u, _)| *u == uniform)
            .map(|(_, value)| value)
    }

    pub fn flag(&self, uniform: Uniform) -> Option<bool> {
        match self.uniform(uniform) {
            Some(Recorded::Bool(value)) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<Call>,
    next_id: u32,
    live_buffers: HashSet<BufferId>,
    live_layouts: HashSet<VertexLayoutId>,
    live_textures: HashSet<TextureId>,
    live_programs: HashSet<ProgramId>,
    in_frame: bool,
    program_in_use: bool,
    fail_programs: bool,
    buffers_before_failure: Option<usize>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every program creation fail as if the shader did not compile.
    pub fn fail_program_creation(&mut self) {
        self.fail_programs = true;
    }

    /// Makes buffer creation fail once `count` buffers have been created.
    pub fn fail_buffer_creation_after(&mut self, count: usize) {
        self.buffers_before_failure = Some(count);
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_buffers(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn live_vertex_layouts(&self) -> usize {
        self.live_layouts.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    /// Replays the recorded calls and returns the state seen by each draw.
    pub fn draws(&self) -> Vec<DrawSnapshot> {
        let mut uniforms: Vec<(Uniform, Recorded)> = Vec::new();
        let mut textures = [None, None];
        let mut draws = Vec::new();

        for call in &self.calls {
            match call {
                Call::BeginFrame => {
                    uniforms.clear();
                    textures = [None, None];
                }
                Call::SetUniform(uniform, value) => {
                    uniforms.retain(|(u, _)| u != uniform);
                    uniforms.push((*uniform, value.clone()));
                }
                Call::BindTexture(unit, texture) => textures[unit.index()] = *texture,
                Call::DrawIndexed {
                    layout,
                    index_count,
                } => draws.push(DrawSnapshot {
                    layout: *layout,
                    index_count: *index_count,
                    uniforms: uniforms.clone(),
                    textures,
                }),
                _ => {}
            }
        }
        draws
    }

    fn require_frame(&self) -> Result<(), GpuError> {
        if self.in_frame {
            Ok(())
        } else {
            Err(GpuError::NoActiveFrame)
        }
    }
}

impl RenderDevice for RecordingDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferId, GpuError> {
        if let Some(remaining) = self.buffers_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(GpuError::Device(format!("out of memory creating '{label}'")));
            }
            *remaining -= 1;
        }

        let id = BufferId(self.next());
        self.live_buffers.insert(id);
        self.calls.push(Call::CreateBuffer {
            id,
            label: label.to_string(),
            kind,
            len: contents.len(),
        });
        Ok(id)
    }

    fn create_vertex_layout(
        &mut self,
        _label: &str,
        bindings: &[VertexBinding],
        index_buffer: BufferId,
    ) -> Result<VertexLayoutId, GpuError> {
        for buffer in bindings.iter().map(|b| b.buffer).chain([index_buffer]) {
            if !self.live_buffers.contains(&buffer) {
                return Err(GpuError::UnknownHandle {
                    kind: "buffer",
                    id: buffer.0,
                });
            }
        }

        let id = VertexLayoutId(self.next());
        self.live_layouts.insert(id);
        self.calls.push(Call::CreateVertexLayout {
            id,
            bindings: bindings.to_vec(),
            index_buffer,
        });
        Ok(id)
    }

    fn create_texture(
        &mut self,
        label: &str,
        _image: &DecodedImage,
        _sampler: &SamplerSettings,
    ) -> Result<TextureId, GpuError> {
        let id = TextureId(self.next());
        self.live_textures.insert(id);
        self.calls.push(Call::CreateTexture {
            id,
            label: label.to_string(),
        });
        Ok(id)
    }

    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, GpuError> {
        if self.fail_programs {
            return Err(GpuError::ShaderCompilation {
                label: source.label.to_string(),
                details: "rejected by recording device".to_string(),
            });
        }

        let id = ProgramId(self.next());
        self.live_programs.insert(id);
        self.calls.push(Call::CreateProgram {
            id,
            label: source.label.to_string(),
        });
        Ok(id)
    }

    fn release_buffer(&mut self, id: BufferId) {
        self.live_buffers.remove(&id);
    }

    fn release_vertex_layout(&mut self, id: VertexLayoutId) {
        self.live_layouts.remove(&id);
    }

    fn release_texture(&mut self, id: TextureId) {
        self.live_textures.remove(&id);
    }

    fn release_program(&mut self, id: ProgramId) {
        self.live_programs.remove(&id);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(Call::SetViewport(width, height));
    }

    fn begin_frame(&mut self, _clear: &ClearState) -> Result<(), GpuError> {
        self.in_frame = true;
        self.program_in_use = false;
        self.calls.push(Call::BeginFrame);
        Ok(())
    }

    fn use_program(&mut self, id: ProgramId) -> Result<(), GpuError> {
        self.require_frame()?;
        if !self.live_programs.contains(&id) {
            return Err(GpuError::UnknownHandle {
                kind: "program",
                id: id.0,
            });
        }
        self.program_in_use = true;
        self.calls.push(Call::UseProgram(id));
        Ok(())
    }

    fn set_uniform(&mut self, uniform: Uniform, value: UniformValue) -> Result<(), GpuError> {
        self.require_frame()?;
        if value.kind() != uniform.expected_kind() {
            return Err(GpuError::UniformType {
                uniform: uniform.name(),
                expected: uniform.expected_kind(),
                found: value.kind(),
            });
        }
        self.calls.push(Call::SetUniform(uniform, value.into()));
        Ok(())
    }

    fn bind_texture(
        &mut self,
        unit: TextureUnit,
        texture: Option<TextureId>,
    ) -> Result<(), GpuError> {
        self.require_frame()?;
        self.calls.push(Call::BindTexture(unit, texture));
        Ok(())
    }

    fn draw_indexed(&mut self, layout: VertexLayoutId, index_count: u32) -> Result<(), GpuError> {
        self.require_frame()?;
        if !self.program_in_use {
            return Err(GpuError::NoProgram);
        }
        if !self.live_layouts.contains(&layout) {
            return Err(GpuError::UnknownHandle {
                kind: "vertex layout",
                id: layout.0,
            });
        }
        self.calls.push(Call::DrawIndexed {
            layout,
            index_count,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        self.require_frame()?;
        self.in_frame = false;
        self.calls.push(Call::EndFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear() -> ClearState {
        ClearState {
            colour: [0.0; 4],
            depth: 1.0,
        }
    }

    #[test]
    fn test_frame_calls_require_begin_frame() {
        let mut device = RecordingDevice::new();

        let result = device.set_uniform(Uniform::Shininess, UniformValue::Float(1.0));
        assert!(matches!(result, Err(GpuError::NoActiveFrame)));
        assert!(matches!(device.end_frame(), Err(GpuError::NoActiveFrame)));
    }

    #[test]
    fn test_wrong_uniform_type_is_rejected() {
        let mut device = RecordingDevice::new();
        device.begin_frame(&clear()).unwrap();

        let result = device.set_uniform(Uniform::ModelXform, UniformValue::Vec3([0.0; 3]));
        assert!(matches!(
            result,
            Err(GpuError::UniformType {
                uniform: "model_xform",
                expected: "mat4",
                found: "vec3"
            })
        ));
    }

    #[test]
    fn test_draw_requires_program() {
        let mut device = RecordingDevice::new();
        let buffer = device
            .create_buffer("indices", BufferKind::Index, &[0; 12])
            .unwrap();
        let layout = device.create_vertex_layout("quad", &[], buffer).unwrap();
        device.begin_frame(&clear()).unwrap();

        assert!(matches!(
            device.draw_indexed(layout, 3),
            Err(GpuError::NoProgram)
        ));
    }
}
