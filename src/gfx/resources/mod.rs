// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Mesh buffers and material textures created once at startup, plus the
//! wgpu-side texture helpers used by the render engine.

pub mod mesh_resources;
pub mod mipmap;
pub mod texture_resource;
pub mod texture_table;

// Re-export main types
pub use mesh_resources::{GpuMesh, MeshResources};
pub use texture_resource::TextureResource;
pub use texture_table::TextureTable;

use crate::{
    error::GpuError,
    geometry::GeometrySource,
    gfx::device::{RenderDevice, SamplerSettings},
    imaging::ImageDecoder,
    scene::Material,
};

/// Everything the frame renderer draws with.
#[derive(Debug, Default)]
pub struct GpuResources {
    pub meshes: MeshResources,
    pub textures: TextureTable,
}

impl GpuResources {
    pub fn build(
        device: &mut dyn RenderDevice,
        geometry: &dyn GeometrySource,
        materials: &[Material],
        decoder: &dyn ImageDecoder,
    ) -> Result<Self, GpuError> {
        let mut meshes = MeshResources::build(device, geometry)?;
        let textures =
            match TextureTable::build(device, materials, decoder, &SamplerSettings::default()) {
                Ok(textures) => textures,
                Err(err) => {
                    meshes.release(device);
                    return Err(err);
                }
            };

        Ok(Self { meshes, textures })
    }

    /// Releases every buffer, vertex layout and texture.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        self.meshes.release(device);
        self.textures.release(device);
    }
}
