use cgmath::Vector3;

use super::MaterialId;

/// Surface description for the fixed Phong-style shading model.
///
/// Texture filenames are stored as given by the asset source; an empty string
/// means the slot has no texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub ambient_colour: Vector3<f32>,
    pub diffuse_colour: Vector3<f32>,
    pub specular_colour: Vector3<f32>,
    pub shininess: f32,
    pub diffuse_texture: String,
    pub specular_texture: String,
}

impl Material {
    /// Creates an untextured material.
    pub fn new(
        id: MaterialId,
        ambient_colour: Vector3<f32>,
        diffuse_colour: Vector3<f32>,
        specular_colour: Vector3<f32>,
        shininess: f32,
    ) -> Self {
        Self {
            id,
            ambient_colour,
            diffuse_colour,
            specular_colour,
            shininess,
            diffuse_texture: String::new(),
            specular_texture: String::new(),
        }
    }

    /// Flat grey material used when the asset source provides none.
    pub fn fallback(id: MaterialId) -> Self {
        Self::new(
            id,
            Vector3::new(0.2, 0.2, 0.2),
            Vector3::new(0.8, 0.8, 0.8),
            Vector3::new(0.0, 0.0, 0.0),
            1.0,
        )
    }

    pub fn with_diffuse_texture(mut self, filename: impl Into<String>) -> Self {
        self.diffuse_texture = filename.into();
        self
    }

    pub fn with_specular_texture(mut self, filename: impl Into<String>) -> Self {
        self.specular_texture = filename.into();
        self
    }

    pub fn diffuse_texture(&self) -> Option<&str> {
        non_empty(&self.diffuse_texture)
    }

    pub fn specular_texture(&self) -> Option<&str> {
        non_empty(&self.specular_texture)
    }
}

fn non_empty(name: &str) -> Option<&str> {
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
