//! Texture resource management for wgpu
//!
//! Provides utilities for creating GPU textures, views, and samplers for the
//! depth buffer and for mipmapped material textures.

use crate::gfx::device::SamplerSettings;

use super::mipmap::{mip_level_count, MipmapGenerator};

/// GPU texture resource containing texture, view, and sampler
///
/// Bundles the three main components needed for texture operations:
/// - Texture: The actual GPU memory allocation
/// - View: Interface for shader access
/// - Sampler: Filtering and addressing configuration
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the renderer
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Format of every material texture
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Creates a depth texture matching the surface configuration
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates a material texture from tightly packed RGBA8 rows
    ///
    /// When `settings.generate_mipmaps` is set the texture gets a full mip
    /// chain, filled on the GPU from level 0.
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating resources
    /// * `queue` - WGPU queue for uploading data and submitting mip blits
    /// * `mipmaps` - Blit pipeline cache
    /// * `rgba` - Pixel data, 4 bytes per pixel, top row first
    /// * `width`, `height` - Size of level 0 in pixels
    /// * `label` - Debug label for the texture
    /// * `settings` - Filtering and addressing
    #[allow(clippy::too_many_arguments)]
    pub fn create_from_rgba_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mipmaps: &mut MipmapGenerator,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
        settings: &SamplerSettings,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let mip_count = if settings.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if mip_count > 1 {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        if mip_count > 1 {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mipmap Encoder"),
            });
            mipmaps.generate(device, &mut encoder, &texture);
            queue.submit(std::iter::once(encoder.finish()));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: settings.address_mode_u,
            address_mode_v: settings.address_mode_v,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: settings.mag_filter,
            min_filter: settings.min_filter,
            mipmap_filter: settings.mipmap_filter,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// 1x1 opaque white texture bound to texture slots no material uses
    pub fn create_fallback(device: &wgpu::Device, queue: &wgpu::Queue, mipmaps: &mut MipmapGenerator) -> Self {
        Self::create_from_rgba_data(
            device,
            queue,
            mipmaps,
            &[255, 255, 255, 255],
            1,
            1,
            "Fallback Texture",
            &SamplerSettings {
                generate_mipmaps: false,
                ..Default::default()
            },
        )
    }
}
