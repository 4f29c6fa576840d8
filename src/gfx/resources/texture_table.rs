use std::collections::{HashMap, HashSet};

use crate::{
    error::GpuError,
    gfx::device::{RenderDevice, SamplerSettings, TextureId},
    imaging::ImageDecoder,
    scene::Material,
};

/// Filename to device texture mapping, built once at startup.
///
/// Each distinct filename is decoded at most once. Filenames that failed to
/// decode are remembered and resolve to nothing, exactly like a material
/// without a texture.
#[derive(Debug, Default)]
pub struct TextureTable {
    entries: HashMap<String, TextureId>,
    failed: HashSet<String>,
}

/// Canonical form of a texture filename: trimmed, forward slashes.
pub fn normalize_filename(filename: &str) -> String {
    filename.trim().replace('\\', "/")
}

impl TextureTable {
    /// Decodes and uploads every diffuse and specular texture named by `materials`.
    pub fn build(
        device: &mut dyn RenderDevice,
        materials: &[Material],
        decoder: &dyn ImageDecoder,
        sampler: &SamplerSettings,
    ) -> Result<Self, GpuError> {
        let mut table = Self::default();

        let filenames = materials
            .iter()
            .flat_map(|material| [material.diffuse_texture(), material.specular_texture()])
            .flatten();

        for filename in filenames {
            let key = normalize_filename(filename);
            if key.is_empty() || table.entries.contains_key(&key) || table.failed.contains(&key) {
                continue;
            }

            let image = decoder.decode(&key);
            if !image.contains_data() {
                log::warn!(
                    "Texture '{key}' has no usable image data ({}x{}, {} bytes); materials using it render untextured",
                    image.width,
                    image.height,
                    image.pixels.len()
                );
                table.failed.insert(key);
                continue;
            }

            match device.create_texture(&key, &image, sampler) {
                Ok(id) => {
                    log::debug!("Texture '{key}' ({}x{}) -> {id:?}", image.width, image.height);
                    table.entries.insert(key, id);
                }
                Err(err) => {
                    table.release(device);
                    return Err(err);
                }
            }
        }

        log::info!(
            "Loaded {} textures ({} failed)",
            table.entries.len(),
            table.failed.len()
        );
        Ok(table)
    }

    /// Device texture for `filename`, if one was created.
    pub fn resolve(&self, filename: Option<&str>) -> Option<TextureId> {
        filename.and_then(|name| self.entries.get(&normalize_filename(name)).copied())
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(&normalize_filename(filename))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        for (_, id) in self.entries.drain() {
            device.release_texture(id);
        }
        self.failed.clear();
    }
}
