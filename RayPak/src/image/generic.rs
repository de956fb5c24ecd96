//! Interchange formats handled by the `image` crate

use std::io::{Cursor, Read, Write};

use image::{DynamicImage, ImageReader};

use super::{ImageFormat, ImageMetadata, PixelFormat, RawImageData};
use crate::error::{Error, Result};
use crate::utils::ReadSeek;

/// PNG, JPEG, BMP or TGA through the `image` crate
#[derive(Debug, Clone, Copy)]
pub struct GenericImageFormat {
    format: image::ImageFormat,
    id: &'static str,
    name: &'static str,
    extensions: &'static [&'static str],
}

impl GenericImageFormat {
    #[must_use]
    pub fn png() -> Self {
        Self {
            format: image::ImageFormat::Png,
            id: "png",
            name: "PNG",
            extensions: &["png"],
        }
    }

    #[must_use]
    pub fn jpeg() -> Self {
        Self {
            format: image::ImageFormat::Jpeg,
            id: "jpeg",
            name: "JPEG",
            extensions: &["jpg", "jpeg"],
        }
    }

    #[must_use]
    pub fn bmp() -> Self {
        Self {
            format: image::ImageFormat::Bmp,
            id: "bmp",
            name: "BMP",
            extensions: &["bmp"],
        }
    }

    #[must_use]
    pub fn tga() -> Self {
        Self {
            format: image::ImageFormat::Tga,
            id: "tga",
            name: "TGA",
            extensions: &["tga"],
        }
    }

    fn read_all(reader: &mut dyn ReadSeek) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl ImageFormat for GenericImageFormat {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        let data = Self::read_all(reader)?;
        let (width, height) = ImageReader::with_format(Cursor::new(data), self.format)
            .into_dimensions()
            .map_err(|e| Error::decode(self.name, e.to_string()))?;
        Ok(ImageMetadata::new(width, height, 0, self.name))
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let data = Self::read_all(reader)?;
        let image = image::load_from_memory_with_format(&data, self.format)
            .map_err(|e| Error::decode(self.name, e.to_string()))?;
        RawImageData::from_dynamic_image(&image)
    }

    fn encode(&self, image: &RawImageData, writer: &mut dyn Write) -> Result<ImageMetadata> {
        let rgba = image.to_rgba_image()?;
        let dynamic = match image.format() {
            PixelFormat::Bgra32 if self.format != image::ImageFormat::Jpeg => DynamicImage::ImageRgba8(rgba),
            _ => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
        };

        let mut encoded = Cursor::new(Vec::new());
        dynamic
            .write_to(&mut encoded, self.format)
            .map_err(|e| Error::ImageEncode {
                format: self.name.to_string(),
                message: e.to_string(),
            })?;
        writer.write_all(encoded.get_ref())?;

        Ok(ImageMetadata::new(image.width(), image.height(), 0, self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_round_trip_keeps_alpha() {
        let pixels: Vec<u8> = (0..4 * 3 * 4).map(|i| (i * 5) as u8).collect();
        let image = RawImageData::new(4, 3, PixelFormat::Bgra32, pixels).unwrap();

        let png = GenericImageFormat::png();
        let mut encoded = Vec::new();
        let meta = png.encode(&image, &mut encoded).unwrap();
        assert_eq!((meta.width, meta.height), (4, 3));

        let mut cursor = Cursor::new(encoded);
        assert_eq!(png.get_metadata(&mut cursor).unwrap().width, 4);
        cursor.set_position(0);
        assert_eq!(png.decode(&mut cursor).unwrap(), image);
    }

    #[test]
    fn test_bmp_opaque_is_bgr() {
        let image = RawImageData::new(2, 2, PixelFormat::Bgr24, vec![9; 12]).unwrap();
        let bmp = GenericImageFormat::bmp();
        let mut encoded = Vec::new();
        bmp.encode(&image, &mut encoded).unwrap();
        let decoded = bmp.decode(&mut Cursor::new(encoded)).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = GenericImageFormat::png()
            .decode(&mut Cursor::new(b"not a png".to_vec()))
            .unwrap_err();
        assert!(err.is_codec_error());
    }
}
