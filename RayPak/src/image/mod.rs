//! Image model and texture codecs
//!
//! Every codec decodes into [`RawImageData`] with top-left row order and one of
//! two canonical layouts ([`PixelFormat::Bgr24`], [`PixelFormat::Bgra32`]).
//! Codecs are reached through the [`ImageFormat`] trait.

mod bc;
mod mipmap;
mod swizzle;

pub mod dds;
pub mod generic;
pub mod gf;
pub mod gxt;
pub mod wrapped;
pub mod xbox360;

use std::io::Write;

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};
use crate::utils::ReadSeek;

pub use dds::DdsImageFormat;
pub use generic::GenericImageFormat;
pub use gf::{GfImageFormat, GfPixelFormat};
pub use gxt::GxtImageFormat;
pub use mipmap::generate_mipmaps;
pub use swizzle::{morton_unswizzle, xbox360_tile, xbox360_untile};
pub use wrapped::{PreferDeclaredSize, PreferInnerSize, SizeHintPolicy, WrappedTextureFormat};
pub use xbox360::Xbox360ImageFormat;

/// Canonical in-memory pixel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 24-bit B, G, R
    Bgr24,
    /// 32-bit B, G, R, A
    Bgra32,
}

impl PixelFormat {
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr24 => 3,
            PixelFormat::Bgra32 => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Bgr24 => "BGR24",
            PixelFormat::Bgra32 => "BGRA32",
        }
    }
}

/// Header-level description of an encoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Extra levels stored after the base level; 0 means none
    pub mipmaps_count: u32,
    /// Source encoding tag, informational only
    pub encoding: String,
}

impl ImageMetadata {
    #[must_use]
    pub fn new(width: u32, height: u32, mipmaps_count: u32, encoding: impl Into<String>) -> Self {
        Self {
            width,
            height,
            mipmaps_count,
            encoding: encoding.into(),
        }
    }

    /// Display key/value pairs for thumbnails
    #[must_use]
    pub fn info(&self) -> Vec<(String, String)> {
        vec![
            ("Size".to_string(), format!("{}x{}", self.width, self.height)),
            ("Mipmaps".to_string(), self.mipmaps_count.to_string()),
            ("Encoding".to_string(), self.encoding.clone()),
        ]
    }
}

/// Decoded pixels in top-left row order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImageData {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl RawImageData {
    /// Wrap a pixel buffer, checking its length against the dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::InvalidImageBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Build from an RGBA buffer, keeping alpha only when it is not fully opaque
    pub(crate) fn from_rgba(width: u32, height: u32, mut rgba: Vec<u8>, keep_alpha: bool) -> Result<Self> {
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        let image = Self::new(width, height, PixelFormat::Bgra32, rgba)?;
        if keep_alpha {
            Ok(image)
        } else {
            Ok(image.convert(PixelFormat::Bgr24))
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether any pixel is not fully opaque
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.format == PixelFormat::Bgra32 && self.data.chunks_exact(4).any(|px| px[3] != 0xFF)
    }

    /// Copy into another layout. Dropping alpha discards it; adding alpha makes pixels opaque.
    #[must_use]
    pub fn convert(&self, format: PixelFormat) -> RawImageData {
        if format == self.format {
            return self.clone();
        }
        let data = match format {
            PixelFormat::Bgr24 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            PixelFormat::Bgra32 => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 0xFF])
                .collect(),
        };
        RawImageData {
            width: self.width,
            height: self.height,
            format,
            data,
        }
    }

    /// RGBA bytes in row-major order
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        let bgra = self.convert(PixelFormat::Bgra32);
        let mut rgba = bgra.data;
        for px in rgba.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        rgba
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.to_rgba()).ok_or(Error::InvalidImageBuffer {
            expected: self.width as usize * self.height as usize * 4,
            actual: self.data.len(),
        })
    }

    /// Convert from any `image` crate image, keeping alpha if the source has it
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self> {
        let has_alpha = image.color().has_alpha();
        let rgba = image.to_rgba8();
        Self::from_rgba(rgba.width(), rgba.height(), rgba.into_raw(), has_alpha)
    }
}

/// Flip rows of a tightly packed buffer in place
pub(crate) fn flip_rows(data: &mut [u8], row_bytes: usize) {
    if row_bytes == 0 {
        return;
    }
    let rows = data.len() / row_bytes;
    for y in 0..rows / 2 {
        let (top, bottom) = data.split_at_mut((rows - 1 - y) * row_bytes);
        top[y * row_bytes..(y + 1) * row_bytes].swap_with_slice(&mut bottom[..row_bytes]);
    }
}

/// A decodable, and possibly encodable, image file format
pub trait ImageFormat {
    /// Short identifier, e.g. `gf`
    fn id(&self) -> &'static str;

    /// Display name
    fn name(&self) -> &'static str;

    /// File extensions without the leading dot
    fn extensions(&self) -> &'static [&'static str];

    fn can_encode(&self) -> bool;

    /// Read header fields only
    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata>;

    /// Decode the base level
    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData>;

    /// Encode `image`, returning the metadata of what was written
    fn encode(&self, image: &RawImageData, writer: &mut dyn Write) -> Result<ImageMetadata> {
        let _ = (image, writer);
        Err(Error::unsupported(self.name(), "encoding"))
    }
}

/// Every built-in standalone image format, proprietary before generic
#[must_use]
pub fn image_formats() -> Vec<Box<dyn ImageFormat>> {
    vec![
        Box::new(GfImageFormat::default()),
        Box::new(GxtImageFormat),
        Box::new(DdsImageFormat::default()),
        Box::new(GenericImageFormat::png()),
        Box::new(GenericImageFormat::jpeg()),
        Box::new(GenericImageFormat::bmp()),
        Box::new(GenericImageFormat::tga()),
    ]
}

/// Format registered for a file extension
#[must_use]
pub fn format_for_extension(ext: &str) -> Option<Box<dyn ImageFormat>> {
    let ext = ext.trim_start_matches('.');
    image_formats()
        .into_iter()
        .find(|f| f.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_checked() {
        let err = RawImageData::new(2, 2, PixelFormat::Bgr24, vec![0; 11]).unwrap_err();
        assert!(matches!(err, Error::InvalidImageBuffer { expected: 12, actual: 11 }));
        assert!(RawImageData::new(2, 2, PixelFormat::Bgra32, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_convert_and_rgba() {
        let image = RawImageData::new(1, 1, PixelFormat::Bgr24, vec![1, 2, 3]).unwrap();
        let bgra = image.convert(PixelFormat::Bgra32);
        assert_eq!(bgra.data(), &[1, 2, 3, 255]);
        assert!(!bgra.has_alpha());
        assert_eq!(image.to_rgba(), vec![3, 2, 1, 255]);
        assert_eq!(bgra.convert(PixelFormat::Bgr24), image);
    }

    #[test]
    fn test_flip_rows() {
        let mut data = vec![1, 1, 2, 2, 3, 3];
        flip_rows(&mut data, 2);
        assert_eq!(data, vec![3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn test_format_lookup() {
        assert_eq!(format_for_extension(".GF").unwrap().id(), "gf");
        assert_eq!(format_for_extension("dds").unwrap().id(), "dds");
        assert_eq!(format_for_extension("jpg").unwrap().id(), "jpeg");
        assert!(format_for_extension("wav").is_none());
    }
}
