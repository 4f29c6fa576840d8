//! Image decoding for material textures.
//!
//! Decoders never fail loudly: an image that cannot be read comes back empty
//! and callers treat it like a material without that texture.

use std::{
    collections::HashMap,
    path::PathBuf,
};

use image::DynamicImage;

/// Raw pixel rows as produced by a decoder, top row first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1 (L), 2 (LA), 3 (RGB) or 4 (RGBA).
    pub components_per_pixel: u32,
    /// 1 or 2; 16-bit components are stored native-endian.
    pub bytes_per_component: u32,
}

impl DecodedImage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tightly packed 8-bit image.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            pixels,
            width,
            height,
            components_per_pixel: 4,
            bytes_per_component: 1,
        }
    }

    /// True when the layout is one `to_rgba8` understands and `pixels`
    /// holds exactly `width * height` pixels of it.
    pub fn contains_data(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.expected_len() == Some(self.pixels.len())
    }

    /// Byte length implied by the dimensions and layout, or `None` for an
    /// unsupported layout or an overflowing size.
    pub fn expected_len(&self) -> Option<usize> {
        if !(1..=4).contains(&self.components_per_pixel)
            || !(1..=2).contains(&self.bytes_per_component)
        {
            return None;
        }
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }

    fn bytes_per_pixel(&self) -> usize {
        (self.components_per_pixel * self.bytes_per_component) as usize
    }
}

/// Turns a texture filename into pixels.
pub trait ImageDecoder {
    /// Decodes `filename`, returning [`DecodedImage::empty`] on any failure.
    fn decode(&self, filename: &str) -> DecodedImage;
}

/// Decodes PNG files relative to a root directory.
#[derive(Debug, Clone)]
pub struct PngDecoder {
    root: PathBuf,
}

impl PngDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageDecoder for PngDecoder {
    fn decode(&self, filename: &str) -> DecodedImage {
        let path = self.root.join(filename);
        match image::open(&path) {
            Ok(image) => {
                log::debug!(
                    "Decoded {} ({}x{})",
                    path.display(),
                    image.width(),
                    image.height()
                );
                from_dynamic(image)
            }
            Err(err) => {
                log::warn!("Failed to decode image {}: {err}", path.display());
                DecodedImage::empty()
            }
        }
    }
}

fn from_dynamic(image: DynamicImage) -> DecodedImage {
    let (width, height) = (image.width(), image.height());
    let (pixels, components_per_pixel, bytes_per_component) = match image {
        DynamicImage::ImageLuma8(buffer) => (buffer.into_raw(), 1, 1),
        DynamicImage::ImageLumaA8(buffer) => (buffer.into_raw(), 2, 1),
        DynamicImage::ImageRgb8(buffer) => (buffer.into_raw(), 3, 1),
        DynamicImage::ImageRgba8(buffer) => (buffer.into_raw(), 4, 1),
        DynamicImage::ImageLuma16(buffer) => (widen(&buffer.into_raw()), 1, 2),
        DynamicImage::ImageLumaA16(buffer) => (widen(&buffer.into_raw()), 2, 2),
        DynamicImage::ImageRgb16(buffer) => (widen(&buffer.into_raw()), 3, 2),
        DynamicImage::ImageRgba16(buffer) => (widen(&buffer.into_raw()), 4, 2),
        other => (other.to_rgba8().into_raw(), 4, 1),
    };

    DecodedImage {
        pixels,
        width,
        height,
        components_per_pixel,
        bytes_per_component,
    }
}

fn widen(samples: &[u16]) -> Vec<u8> {
    bytemuck::cast_slice(samples).to_vec()
}

/// In-memory decoder keyed by filename, for procedural scenes and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDecoder {
    images: HashMap<String, DecodedImage>,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filename: impl Into<String>, image: DecodedImage) {
        self.images.insert(filename.into(), image);
    }

    pub fn with_image(mut self, filename: impl Into<String>, image: DecodedImage) -> Self {
        self.insert(filename, image);
        self
    }
}

impl ImageDecoder for MemoryDecoder {
    fn decode(&self, filename: &str) -> DecodedImage {
        self.images.get(filename).cloned().unwrap_or_default()
    }
}

/// Expands any decoded layout to tightly packed RGBA8.
///
/// Grey is replicated into RGB, a missing alpha becomes 255 and 16-bit
/// components keep their high byte.
///
/// An image that fails [`DecodedImage::contains_data`] yields an empty buffer.
pub fn to_rgba8(image: &DecodedImage) -> Vec<u8> {
    if !image.contains_data() {
        return Vec::new();
    }
    if image.components_per_pixel == 4 && image.bytes_per_component == 1 {
        return image.pixels.clone();
    }

    let pixel_count = image.width as usize * image.height as usize;
    let stride = image.bytes_per_pixel();
    let mut out = Vec::with_capacity(pixel_count * 4);

    let component = |pixel: &[u8], index: usize| -> u8 {
        match image.bytes_per_component {
            2 => {
                let start = index * 2;
                (u16::from_ne_bytes([pixel[start], pixel[start + 1]]) >> 8) as u8
            }
            _ => pixel[index],
        }
    };

    for pixel in image.pixels.chunks_exact(stride).take(pixel_count) {
        let rgba = match image.components_per_pixel {
            1 => {
                let l = component(pixel, 0);
                [l, l, l, 255]
            }
            2 => {
                let l = component(pixel, 0);
                [l, l, l, component(pixel, 1)]
            }
            3 => [component(pixel, 0), component(pixel, 1), component(pixel, 2), 255],
            _ => [
                component(pixel, 0),
                component(pixel, 1),
                component(pixel, 2),
                component(pixel, 3),
            ],
        };
        out.extend_from_slice(&rgba);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_data() {
        assert!(!DecodedImage::empty().contains_data());
        assert!(DecodedImage::from_rgba8(1, 1, vec![1, 2, 3, 4]).contains_data());
    }

    #[test]
    fn test_short_pixel_buffer_has_no_data() {
        let image = DecodedImage::from_rgba8(4, 4, vec![1, 2, 3, 4]);
        assert_eq!(image.expected_len(), Some(64));
        assert!(!image.contains_data());
        assert!(to_rgba8(&image).is_empty());
    }

    #[test]
    fn test_unsupported_layouts_have_no_data() {
        let zero_components = DecodedImage {
            pixels: vec![1, 2, 3, 4],
            width: 1,
            height: 1,
            components_per_pixel: 0,
            bytes_per_component: 1,
        };
        assert!(!zero_components.contains_data());
        assert!(to_rgba8(&zero_components).is_empty());

        let wide_components = DecodedImage {
            pixels: vec![0; 4],
            width: 1,
            height: 1,
            components_per_pixel: 1,
            bytes_per_component: 4,
        };
        assert_eq!(wide_components.expected_len(), None);
        assert!(!wide_components.contains_data());

        let too_many_components = DecodedImage {
            pixels: vec![0; 5],
            width: 1,
            height: 1,
            components_per_pixel: 5,
            bytes_per_component: 1,
        };
        assert!(!too_many_components.contains_data());
    }

    #[test]
    fn test_long_pixel_buffer_has_no_data() {
        let image = DecodedImage::from_rgba8(1, 1, vec![0; 8]);
        assert!(!image.contains_data());
    }

    #[test]
    fn test_memory_decoder_unknown_is_empty() {
        let decoder = MemoryDecoder::new()
            .with_image("brick.png", DecodedImage::from_rgba8(1, 1, vec![9; 4]));

        assert!(decoder.decode("brick.png").contains_data());
        assert!(!decoder.decode("marble.png").contains_data());
    }

    #[test]
    fn test_rgb_expands_with_opaque_alpha() {
        let image = DecodedImage {
            pixels: vec![10, 20, 30, 40, 50, 60],
            width: 2,
            height: 1,
            components_per_pixel: 3,
            bytes_per_component: 1,
        };
        assert_eq!(to_rgba8(&image), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_grey_alpha_expands() {
        let image = DecodedImage {
            pixels: vec![7, 128],
            width: 1,
            height: 1,
            components_per_pixel: 2,
            bytes_per_component: 1,
        };
        assert_eq!(to_rgba8(&image), vec![7, 7, 7, 128]);
    }

    #[test]
    fn test_sixteen_bit_narrows_to_high_byte() {
        let image = DecodedImage {
            pixels: widen(&[0xABCD, 0x1200, 0xFFFF]),
            width: 1,
            height: 1,
            components_per_pixel: 3,
            bytes_per_component: 2,
        };
        assert_eq!(to_rgba8(&image), vec![0xAB, 0x12, 0xFF, 255]);
    }

    #[test]
    fn test_png_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("sponza-imaging-{}", rand::random::<u32>()));
        std::fs::create_dir_all(dir.join("textures")).unwrap();

        let source = image::RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 200]));
        source.save(dir.join("textures/brick.png")).unwrap();

        let decoder = PngDecoder::new(&dir);
        let decoded = decoder.decode("textures/brick.png");
        let missing = decoder.decode("textures/missing.png");
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.components_per_pixel, 3);
        assert_eq!(decoded.bytes_per_component, 1);
        assert_eq!(&decoded.pixels[..3], &[0, 0, 200]);
        assert!(!missing.contains_data());
    }
}
