//! RGBA8 textures decoded with `image`

use crate::kind::ResourceKind;
use crate::loader::LoaderStrategy;
use crate::resource::{Asset, AssetHeader, Resource};
use std::path::Path;
use tessera_core::{ByteBuffer, Result, TesseraError};

const MAGENTA: [u8; 4] = [255, 0, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// A 2D image stored as tightly packed RGBA8 rows
#[derive(Debug, Clone)]
pub struct Texture {
    header: AssetHeader,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Default for Texture {
    /// 2x2 magenta/black checker, loud enough to spot a missing texture
    fn default() -> Self {
        let pixels = [MAGENTA, BLACK, BLACK, MAGENTA].concat();
        Self {
            header: AssetHeader::new(ResourceKind::Texture),
            width: 2,
            height: 2,
            pixels,
        }
    }
}

impl Texture {
    /// RGBA of the pixel at (x, y), if in bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

impl Asset for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn header(&self) -> &AssetHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AssetHeader {
        &mut self.header
    }

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()> {
        if self.pixels.len() != Self::expected_len(self.width, self.height) {
            return Err(TesseraError::InvalidOperation(format!(
                "{}x{} texture holds {} bytes of pixels",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        buffer.write(&self.width);
        buffer.write(&self.height);
        buffer.write_bytes(&self.pixels);
        Ok(())
    }

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()> {
        let width = buffer.read::<u32>()?;
        let height = buffer.read::<u32>()?;
        let pixels = buffer.read_bytes()?;
        if pixels.len() != Self::expected_len(width, height) {
            return Err(TesseraError::ParseError(format!(
                "{}x{} texture expects {} bytes, found {}",
                width,
                height,
                Self::expected_len(width, height),
                pixels.len()
            )));
        }
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }
}

/// Decodes common image formats into RGBA8
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureLoader;

impl LoaderStrategy for TextureLoader {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn name(&self) -> &'static str {
        "image"
    }

    fn accepted_extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp", "tga"]
    }

    fn load_from_file(&self, path: &Path) -> Result<Box<dyn Resource>> {
        let bytes = std::fs::read(path)?;
        let format = image::ImageFormat::from_path(path).map_err(|e| {
            TesseraError::ParseError(format!("{}: {}", path.display(), e))
        })?;
        let rgba = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| {
                TesseraError::ParseError(format!("Failed to decode '{}': {}", path.display(), e))
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Box::new(Texture {
            width,
            height,
            pixels: rgba.into_raw(),
            ..Texture::default()
        }))
    }

    fn default_resource(&self) -> Box<dyn Resource> {
        Box::new(Texture::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_offset_past_u32_range() {
        let tex = Texture {
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
            ..Texture::default()
        };
        assert_eq!(tex.pixel(69_999, 69_999), None);
        assert_eq!(tex.pixel(70_000, 0), None);
    }

    #[test]
    fn test_default_checker() {
        let tex = Texture::default();
        assert_eq!(tex.pixel(0, 0), Some(MAGENTA));
        assert_eq!(tex.pixel(1, 0), Some(BLACK));
        assert_eq!(tex.pixel(1, 1), Some(MAGENTA));
        assert_eq!(tex.pixel(2, 0), None);
    }

    #[test]
    fn test_payload_round_trip() {
        let tex = Texture {
            width: 3,
            height: 1,
            pixels: (0u8..12).collect(),
            ..Texture::default()
        };
        let mut buffer = ByteBuffer::new();
        Asset::serialize_data(&tex, &mut buffer).unwrap();

        let mut restored = Texture::default();
        Asset::deserialize_data(&mut restored, &mut buffer).unwrap();
        assert_eq!((restored.width, restored.height), (3, 1));
        assert_eq!(restored.pixels, tex.pixels);
    }

    #[test]
    fn test_pixel_length_mismatch() {
        let mut buffer = ByteBuffer::new();
        buffer.write(&4u32);
        buffer.write(&4u32);
        buffer.write_bytes(&[0u8; 10]);

        let mut tex = Texture::default();
        assert!(matches!(
            Asset::deserialize_data(&mut tex, &mut buffer),
            Err(TesseraError::ParseError(_))
        ));
        assert_eq!(tex.width, 2);
    }

    #[test]
    fn test_load_png() {
        let dir = std::env::temp_dir().join(format!("tessera_texture_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dot.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.save(&path).unwrap();

        let loaded = TextureLoader.load_from_file(&path).unwrap();
        let tex = loaded.downcast_ref::<Texture>().unwrap();
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.pixel(2, 1), Some([10, 20, 30, 255]));

        std::fs::write(dir.join("bad.png"), b"not a png").unwrap();
        assert!(matches!(
            TextureLoader.load_from_file(&dir.join("bad.png")),
            Err(TesseraError::ParseError(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
