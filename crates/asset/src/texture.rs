//! Texture decoding into CPU-side RGBA8 data.

use anyhow::{Context, Result};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    /// Path the texture was referenced by, for logs and labels.
    pub name: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels, checking the buffer size.
    pub fn new_rgba8(name: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            data.len() == expected,
            "RGBA8 texture {}x{} needs {} bytes, got {}",
            width,
            height,
            expected,
            data.len()
        );
        Ok(Self {
            name: name.into(),
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode an encoded image (PNG/JPEG) into RGBA8.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .with_context(|| format!("Failed to decode image '{name}'"))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded texture '{}' {}x{}", name, width, height);

        Self::new_rgba8(name, width, height, rgba.into_raw())
    }

    /// 1x1 texture of a single color.
    pub fn solid(name: &str, rgba: [u8; 4]) -> Self {
        Self {
            name: name.to_string(),
            data: rgba.to_vec(),
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode");
        let tex = TextureData::decode("t.png", &png).expect("decode");
        assert_eq!((tex.width, tex.height), (2, 3));
        assert!(tex.is_valid());
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        assert!(TextureData::new_rgba8("bad", 2, 2, vec![0; 3]).is_err());
        assert!(TextureData::solid("white", [255; 4]).is_valid());
    }

    #[test]
    fn garbage_is_not_an_image() {
        assert!(TextureData::decode("x.jpg", b"not an image").is_err());
    }
}
