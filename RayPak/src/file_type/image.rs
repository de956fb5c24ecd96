//! Standalone images: proprietary codecs first, then generic formats

use std::io::{Seek, SeekFrom, Write};

use super::{FileType, ThumbnailData, copy_stream, shrink};
use crate::error::{Error, Result};
use crate::image::{ImageFormat, RawImageData, format_for_extension, image_formats};
use crate::utils::{FileExtension, ReadSeek};

/// Every format in [`image_formats`], keyed by extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileType;

impl ImageFileType {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn codec(ext: &FileExtension) -> Result<Box<dyn ImageFormat>> {
        format_for_extension(ext.primary()).ok_or_else(|| Error::unsupported(ext.to_string(), "image conversion"))
    }
}

/// Decode `input` with the codec registered for `ext`
pub(crate) fn decode_as(ext: &FileExtension, input: &mut dyn ReadSeek) -> Result<RawImageData> {
    let codec = ImageFileType::codec(ext)?;
    input.seek(SeekFrom::Start(0))?;
    codec.decode(input)
}

/// Encode `image` with the codec registered for `ext`
pub(crate) fn encode_as(ext: &FileExtension, image: &RawImageData, output: &mut dyn Write) -> Result<()> {
    let codec = ImageFileType::codec(ext)?;
    if !codec.can_encode() {
        return Err(Error::unsupported(codec.name(), "encoding"));
    }
    codec.encode(image, output)?;
    Ok(())
}

/// Extensions of every encodable standalone format
pub(crate) fn encodable_extensions() -> Vec<String> {
    image_formats()
        .iter()
        .filter(|f| f.can_encode())
        .flat_map(|f| f.extensions().iter().map(|e| (*e).to_string()))
        .collect()
}

impl FileType for ImageFileType {
    fn name(&self) -> &'static str {
        "Image"
    }

    fn is_of_type(&self, ext: &FileExtension) -> bool {
        format_for_extension(ext.primary()).is_some()
    }

    fn import_formats(&self) -> Vec<String> {
        image_formats()
            .iter()
            .flat_map(|f| f.extensions().iter().map(|e| (*e).to_string()))
            .collect()
    }

    fn export_formats(&self) -> Vec<String> {
        encodable_extensions()
    }

    fn load_thumbnail(&self, reader: &mut dyn ReadSeek, ext: &FileExtension) -> Result<ThumbnailData> {
        let codec = Self::codec(ext)?;
        reader.seek(SeekFrom::Start(0))?;
        let metadata = codec.get_metadata(reader)?;
        reader.seek(SeekFrom::Start(0))?;
        let image = codec.decode(reader)?;

        let mut info = vec![("Format".to_string(), codec.name().to_string())];
        info.extend(metadata.info());
        Ok(ThumbnailData {
            thumbnail: Some(shrink(image.to_rgba_image()?)),
            info,
        })
    }

    fn convert_to(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        if in_fmt == out_fmt {
            return copy_stream(input, output);
        }
        let image = decode_as(in_fmt, input)?;
        encode_as(out_fmt, &image, output)
    }

    fn convert_from(
        &self,
        in_fmt: &FileExtension,
        out_fmt: &FileExtension,
        _current: Option<&mut dyn ReadSeek>,
        input: &mut dyn ReadSeek,
        output: &mut dyn Write,
    ) -> Result<()> {
        self.convert_to(in_fmt, out_fmt, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{GfImageFormat, PixelFormat};
    use std::io::Cursor;

    fn gf_bytes() -> Vec<u8> {
        let data: Vec<u8> = (0..6 * 4).flat_map(|i| [i as u8, 10, 20]).collect();
        let image = RawImageData::new(6, 4, PixelFormat::Bgr24, data).unwrap();
        let mut out = Vec::new();
        GfImageFormat::default().encode(&image, &mut out).unwrap();
        out
    }

    #[test]
    fn test_thumbnail_and_info() {
        let thumb = ImageFileType
            .load_thumbnail(&mut Cursor::new(gf_bytes()), &FileExtension::new("gf"))
            .unwrap();
        let bitmap = thumb.thumbnail.unwrap();
        assert_eq!(bitmap.dimensions(), (6, 4));
        assert!(thumb.info.contains(&("Size".to_string(), "6x4".to_string())));
    }

    #[test]
    fn test_same_format_is_copied() {
        let gf = FileExtension::new("gf");
        let bytes = b"not even a GF file".to_vec();
        let mut out = Vec::new();
        ImageFileType
            .convert_to(&gf, &gf, &mut Cursor::new(bytes.clone()), &mut out)
            .unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_convert_gf_to_png_and_back() {
        let (gf, png) = (FileExtension::new("gf"), FileExtension::new("png"));
        let mut exported = Vec::new();
        ImageFileType
            .convert_to(&gf, &png, &mut Cursor::new(gf_bytes()), &mut exported)
            .unwrap();
        assert!(exported.starts_with(b"\x89PNG"));

        let mut imported = Vec::new();
        ImageFileType
            .convert_from(&png, &gf, None, &mut Cursor::new(exported), &mut imported)
            .unwrap();
        assert_eq!(imported, gf_bytes());
    }

    #[test]
    fn test_gxt_export_only() {
        assert!(ImageFileType.import_formats().contains(&"gxt".to_string()));
        assert!(!ImageFileType.export_formats().contains(&"gxt".to_string()));

        let image = RawImageData::new(1, 1, PixelFormat::Bgr24, vec![0; 3]).unwrap();
        let err = encode_as(&FileExtension::new("gxt"), &image, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }
}
