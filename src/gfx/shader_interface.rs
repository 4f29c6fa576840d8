//! Names and slots shared between the renderer and the Phong shaders.
//!
//! These strings must match the shader sources exactly.

/// A vertex attribute consumed by the vertex shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub slot: u32,
    pub name: &'static str,
    pub format: wgpu::VertexFormat,
}

/// Every mesh is drawn with one buffer per attribute, in this slot order.
pub const MESH_VERTEX_LAYOUT: [VertexAttribute; 3] = [
    VertexAttribute {
        slot: 0,
        name: "vertex_position",
        format: wgpu::VertexFormat::Float32x3,
    },
    VertexAttribute {
        slot: 1,
        name: "vertex_normal",
        format: wgpu::VertexFormat::Float32x3,
    },
    VertexAttribute {
        slot: 2,
        name: "texture_coord",
        format: wgpu::VertexFormat::Float32x2,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    ProjectionViewModelXform,
    ModelXform,
    CameraPosition,
    LightPosition,
    LightIntensity,
    LightRange,
    DiffuseMaterialColour,
    AmbientMaterialColour,
    SpecularColour,
    Shininess,
    DiffTexSample,
    SpecTexSample,
    UseDiffTexture,
    UseSpecTexture,
    /// Debug view: shade by world-space normal.
    ToggleNormal,
}

impl Uniform {
    pub const ALL: [Uniform; 15] = [
        Uniform::ProjectionViewModelXform,
        Uniform::ModelXform,
        Uniform::CameraPosition,
        Uniform::LightPosition,
        Uniform::LightIntensity,
        Uniform::LightRange,
        Uniform::DiffuseMaterialColour,
        Uniform::AmbientMaterialColour,
        Uniform::SpecularColour,
        Uniform::Shininess,
        Uniform::DiffTexSample,
        Uniform::SpecTexSample,
        Uniform::UseDiffTexture,
        Uniform::UseSpecTexture,
        Uniform::ToggleNormal,
    ];

    /// The identifier used in the shader sources.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::ProjectionViewModelXform => "projection_view_model_xform",
            Uniform::ModelXform => "model_xform",
            Uniform::CameraPosition => "Camera_Position",
            Uniform::LightPosition => "Light_Position",
            Uniform::LightIntensity => "Light_Intensity",
            Uniform::LightRange => "Light_Range",
            Uniform::DiffuseMaterialColour => "diffuse_material_colour",
            Uniform::AmbientMaterialColour => "ambient_material_colour",
            Uniform::SpecularColour => "specular_colour",
            Uniform::Shininess => "shininess",
            Uniform::DiffTexSample => "diff_tex_sample",
            Uniform::SpecTexSample => "spec_tex_sample",
            Uniform::UseDiffTexture => "useDiffTexture",
            Uniform::UseSpecTexture => "useSpecTexture",
            Uniform::ToggleNormal => "toggle_normal",
        }
    }

    /// The [`UniformValue::kind`](crate::gfx::device::UniformValue::kind) this uniform accepts.
    pub fn expected_kind(self) -> &'static str {
        match self {
            Uniform::ProjectionViewModelXform | Uniform::ModelXform => "mat4",
            Uniform::CameraPosition
            | Uniform::DiffuseMaterialColour
            | Uniform::AmbientMaterialColour
            | Uniform::SpecularColour => "vec3",
            Uniform::LightPosition | Uniform::LightIntensity => "vec3[]",
            Uniform::LightRange => "float[]",
            Uniform::Shininess => "float",
            Uniform::DiffTexSample | Uniform::SpecTexSample => "int",
            Uniform::UseDiffTexture | Uniform::UseSpecTexture | Uniform::ToggleNormal => "bool",
        }
    }
}

/// Fixed texture units for the two material samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Diffuse = 0,
    Specular = 1,
}

impl TextureUnit {
    pub fn index(self) -> usize {
        self as usize
    }

    /// The sampler uniform reading this unit.
    pub fn sampler_uniform(self) -> Uniform {
        match self {
            TextureUnit::Diffuse => Uniform::DiffTexSample,
            TextureUnit::Specular => Uniform::SpecTexSample,
        }
    }
}

/// Uniform names missing from the given shader sources.
pub fn missing_uniforms(sources: &[&str]) -> Vec<Uniform> {
    Uniform::ALL
        .into_iter()
        .filter(|uniform| !sources.iter().any(|source| declares(source, uniform.name())))
        .collect()
}

fn declares(source: &str, name: &str) -> bool {
    source.match_indices(name).any(|(start, _)| {
        let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let before = source[..start].chars().next_back();
        let after = source[start + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Uniform::ALL.iter().map(|u| u.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Uniform::ALL.len());
    }

    #[test]
    fn test_phong_shaders_declare_every_uniform() {
        let sources = [
            include_str!("rendering/shaders/phong_vs.wgsl"),
            include_str!("rendering/shaders/phong_fs.wgsl"),
        ];
        assert!(missing_uniforms(&sources).is_empty());
    }

    #[test]
    fn test_partial_identifier_is_not_a_declaration() {
        let missing = missing_uniforms(&["var<uniform> shininess_scale: f32;"]);
        assert!(missing.contains(&Uniform::Shininess));
    }

    #[test]
    fn test_vertex_slots_in_order() {
        for (i, attribute) in MESH_VERTEX_LAYOUT.iter().enumerate() {
            assert_eq!(attribute.slot as usize, i);
        }
    }
}
