//! UbiArt cooked textures (`.tga.ckd`, `.png.ckd`)
//!
//! A 44-byte big-endian `TEX` header wraps a platform texture: DDS on PC, GXT
//! on PS Vita, a tiled texture on Xbox 360. Bare DDS files without the header
//! are accepted too.

use std::fmt::Debug;
use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::{DdsImageFormat, GxtImageFormat, ImageFormat, ImageMetadata, RawImageData, Xbox360ImageFormat};
use crate::config::Platform;
use crate::error::{Error, Result};
use crate::utils::ReadSeek;

pub const TEX_MAGIC: u32 = 0x5445_5800;
pub const TEX_HEADER_SIZE: u32 = 44;
const DEFAULT_VERSION: u32 = 9;

// ============================================================================
// Size policy
// ============================================================================

/// Chooses between the size declared in the `TEX` header and the size the
/// inner texture reports
pub trait SizeHintPolicy: Debug {
    fn resolve(&self, declared: (u32, u32), inner: Option<(u32, u32)>) -> (u32, u32);
}

/// The inner texture's size wins whenever it can be read
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferInnerSize;

impl SizeHintPolicy for PreferInnerSize {
    fn resolve(&self, declared: (u32, u32), inner: Option<(u32, u32)>) -> (u32, u32) {
        inner.unwrap_or(declared)
    }
}

/// The header's size wins unless it is empty
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferDeclaredSize;

impl SizeHintPolicy for PreferDeclaredSize {
    fn resolve(&self, declared: (u32, u32), inner: Option<(u32, u32)>) -> (u32, u32) {
        match inner {
            Some(inner) if declared.0 == 0 || declared.1 == 0 => inner,
            _ => declared,
        }
    }
}

// ============================================================================
// Header
// ============================================================================

/// The `TEX` header preceding the platform texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexHeader {
    pub version: u32,
    pub texture_size: u32,
    pub width: u16,
    pub height: u16,
    pub unknown0: u16,
    pub unknown1: u16,
    pub unknown: [u32; 4],
}

impl Default for TexHeader {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            texture_size: 0,
            width: 0,
            height: 0,
            unknown0: 0,
            unknown1: 0,
            unknown: [0; 4],
        }
    }
}

impl TexHeader {
    /// Parse the header, or `None` when `bytes` does not start with one
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.len() < 8 || bytes[4..8] != TEX_MAGIC.to_be_bytes() {
            return Ok(None);
        }
        let mut reader = Cursor::new(bytes);
        let version = reader.read_u32::<BigEndian>()?;
        let _magic = reader.read_u32::<BigEndian>()?;
        let header_size = reader.read_u32::<BigEndian>()?;
        if header_size != TEX_HEADER_SIZE {
            return Err(Error::decode("TEX", format!("header size {header_size}, expected {TEX_HEADER_SIZE}")));
        }
        let texture_size = reader.read_u32::<BigEndian>()?;
        let width = reader.read_u16::<BigEndian>()?;
        let height = reader.read_u16::<BigEndian>()?;
        let unknown0 = reader.read_u16::<BigEndian>()?;
        let unknown1 = reader.read_u16::<BigEndian>()?;
        let _texture_size = reader.read_u32::<BigEndian>()?;
        let mut unknown = [0u32; 4];
        for value in &mut unknown {
            *value = reader.read_u32::<BigEndian>()?;
        }

        Ok(Some(Self {
            version,
            texture_size,
            width,
            height,
            unknown0,
            unknown1,
            unknown,
        }))
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<BigEndian>(self.version)?;
        writer.write_u32::<BigEndian>(TEX_MAGIC)?;
        writer.write_u32::<BigEndian>(TEX_HEADER_SIZE)?;
        writer.write_u32::<BigEndian>(self.texture_size)?;
        writer.write_u16::<BigEndian>(self.width)?;
        writer.write_u16::<BigEndian>(self.height)?;
        writer.write_u16::<BigEndian>(self.unknown0)?;
        writer.write_u16::<BigEndian>(self.unknown1)?;
        writer.write_u32::<BigEndian>(self.texture_size)?;
        for value in self.unknown {
            writer.write_u32::<BigEndian>(value)?;
        }
        Ok(())
    }
}

/// A cooked texture split into its optional header and the inner texture bytes
struct Unwrapped {
    header: Option<TexHeader>,
    inner: Vec<u8>,
}

// ============================================================================
// Codec
// ============================================================================

/// Cooked texture codec for one platform
#[derive(Debug, Clone, Copy, Default)]
pub struct WrappedTextureFormat<P = PreferInnerSize> {
    platform: Platform,
    policy: P,
}

impl WrappedTextureFormat {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            policy: PreferInnerSize,
        }
    }
}

impl<P: SizeHintPolicy> WrappedTextureFormat<P> {
    /// Replace the size policy
    #[must_use]
    pub fn with_policy<Q: SizeHintPolicy>(self, policy: Q) -> WrappedTextureFormat<Q> {
        WrappedTextureFormat {
            platform: self.platform,
            policy,
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn split(reader: &mut dyn ReadSeek) -> Result<Unwrapped> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        match TexHeader::parse(&bytes)? {
            Some(header) => Ok(Unwrapped {
                header: Some(header),
                inner: bytes.split_off(TEX_HEADER_SIZE as usize),
            }),
            None if bytes.starts_with(&super::dds::MAGIC) => Ok(Unwrapped {
                header: None,
                inner: bytes,
            }),
            None => Err(Error::decode("TEX", "missing TEX header")),
        }
    }

    /// Codec for the inner texture, by magic first and platform second
    fn inner_format(&self, inner: &[u8]) -> Result<Box<dyn ImageFormat>> {
        if inner.starts_with(&super::dds::MAGIC) {
            return Ok(Box::new(DdsImageFormat::default()));
        }
        if inner.starts_with(&super::gxt::MAGIC) {
            return Ok(Box::new(GxtImageFormat));
        }
        match self.platform {
            Platform::Xbox360 => Ok(Box::new(Xbox360ImageFormat)),
            platform => Err(Error::decode(
                "TEX",
                format!("unrecognized inner texture for {}", platform.as_str()),
            )),
        }
    }

    /// Encode `image` as DDS wrapped in a `TEX` header.
    ///
    /// When `template` holds an existing cooked texture its header is kept and
    /// only the size fields are patched; otherwise a fresh header is written.
    pub fn encode_with_template(
        &self,
        image: &RawImageData,
        template: Option<&[u8]>,
        writer: &mut dyn Write,
    ) -> Result<ImageMetadata> {
        if self.platform != Platform::Pc {
            return Err(Error::unsupported(
                format!("cooked texture ({})", self.platform.as_str()),
                "encoding",
            ));
        }
        let (width, height) = match (u16::try_from(image.width()), u16::try_from(image.height())) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(Error::ImageEncode {
                    format: "TEX".to_string(),
                    message: format!("{}x{} does not fit the header", image.width(), image.height()),
                });
            }
        };

        let mut inner = Vec::new();
        let metadata = DdsImageFormat::default().encode(image, &mut inner)?;

        let mut header = match template {
            Some(bytes) => TexHeader::parse(bytes).ok().flatten().unwrap_or_default(),
            None => TexHeader::default(),
        };
        header.width = width;
        header.height = height;
        header.texture_size = u32::try_from(inner.len()).map_err(|_| Error::ImageEncode {
            format: "TEX".to_string(),
            message: "texture larger than 4 GiB".to_string(),
        })?;

        header.write(writer)?;
        writer.write_all(&inner)?;
        Ok(metadata)
    }
}

impl<P: SizeHintPolicy> ImageFormat for WrappedTextureFormat<P> {
    fn id(&self) -> &'static str {
        "tex"
    }

    fn name(&self) -> &'static str {
        "Cooked texture"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tga.ckd", "png.ckd"]
    }

    fn can_encode(&self) -> bool {
        self.platform == Platform::Pc
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        let Unwrapped { header, inner } = Self::split(reader)?;

        let inner_meta = self
            .inner_format(&inner)
            .and_then(|format| format.get_metadata(&mut Cursor::new(inner.as_slice())));
        let inner_meta = match inner_meta {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!("inner texture metadata unavailable: {e}");
                None
            }
        };

        let declared = header
            .as_ref()
            .map(|h| (u32::from(h.width), u32::from(h.height)))
            .unwrap_or_default();
        let (width, height) = self
            .policy
            .resolve(declared, inner_meta.as_ref().map(|m| (m.width, m.height)));
        if header.is_some() && inner_meta.as_ref().is_some_and(|m| (m.width, m.height) != declared) {
            tracing::debug!(
                "TEX header declares {}x{}, inner texture is {:?}; using {width}x{height}",
                declared.0,
                declared.1,
                inner_meta.as_ref().map(|m| (m.width, m.height)),
            );
        }

        Ok(match inner_meta {
            Some(meta) => ImageMetadata::new(width, height, meta.mipmaps_count, meta.encoding),
            None => ImageMetadata::new(width, height, 0, "unknown"),
        })
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let Unwrapped { inner, .. } = Self::split(reader)?;
        self.inner_format(&inner)?.decode(&mut Cursor::new(inner.as_slice()))
    }

    fn encode(&self, image: &RawImageData, writer: &mut dyn Write) -> Result<ImageMetadata> {
        self.encode_with_template(image, None, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;

    fn image(width: u32, height: u32) -> RawImageData {
        RawImageData::new(width, height, PixelFormat::Bgr24, vec![0x40; (width * height * 3) as usize]).unwrap()
    }

    fn dds(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DdsImageFormat::default().encode(&image(width, height), &mut out).unwrap();
        out
    }

    fn wrap(header: &TexHeader, inner: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        out.extend_from_slice(inner);
        out
    }

    fn declared(width: u16, height: u16) -> TexHeader {
        TexHeader {
            width,
            height,
            ..TexHeader::default()
        }
    }

    #[test]
    fn test_header_layout() {
        let header = TexHeader {
            version: 13,
            texture_size: 0x1234,
            width: 64,
            height: 32,
            unknown0: 1,
            unknown1: 2,
            unknown: [3, 4, 5, 6],
        };
        let bytes = wrap(&header, &[]);
        assert_eq!(bytes.len(), TEX_HEADER_SIZE as usize);
        assert_eq!(&bytes[4..8], b"TEX\0");
        assert_eq!(&bytes[24..28], &0x1234u32.to_be_bytes());
        assert_eq!(TexHeader::parse(&bytes).unwrap(), Some(header));
    }

    #[test]
    fn test_inner_size_wins_by_default() {
        let file = wrap(&declared(64, 64), &dds(16, 8));
        let meta = WrappedTextureFormat::new(Platform::Pc)
            .get_metadata(&mut Cursor::new(file.clone()))
            .unwrap();
        assert_eq!((meta.width, meta.height), (16, 8));
        assert_eq!(meta.encoding, "DXT1");

        let meta = WrappedTextureFormat::new(Platform::Pc)
            .with_policy(PreferDeclaredSize)
            .get_metadata(&mut Cursor::new(file))
            .unwrap();
        assert_eq!((meta.width, meta.height), (64, 64));
    }

    #[test]
    fn test_declared_size_when_inner_unreadable() {
        let file = wrap(&declared(64, 32), b"not a texture");
        let meta = WrappedTextureFormat::new(Platform::Pc)
            .get_metadata(&mut Cursor::new(file.clone()))
            .unwrap();
        assert_eq!((meta.width, meta.height), (64, 32));

        let err = WrappedTextureFormat::new(Platform::Pc)
            .decode(&mut Cursor::new(file))
            .unwrap_err();
        assert!(err.is_codec_error());
    }

    #[test]
    fn test_bare_dds_accepted() {
        let decoded = WrappedTextureFormat::new(Platform::Pc)
            .decode(&mut Cursor::new(dds(8, 4)))
            .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_encode_patches_template() {
        let template = wrap(
            &TexHeader {
                version: 13,
                unknown: [7, 0, 0, 9],
                ..declared(256, 256)
            },
            &dds(4, 4),
        );
        let codec = WrappedTextureFormat::new(Platform::Pc);
        let mut out = Vec::new();
        codec.encode_with_template(&image(8, 4), Some(&template), &mut out).unwrap();

        let header = TexHeader::parse(&out).unwrap().unwrap();
        assert_eq!((header.version, header.unknown), (13, [7, 0, 0, 9]));
        assert_eq!((header.width, header.height), (8, 4));
        assert_eq!(header.texture_size as usize, out.len() - TEX_HEADER_SIZE as usize);

        let mut fresh = Vec::new();
        codec.encode(&image(8, 4), &mut fresh).unwrap();
        assert_eq!(TexHeader::parse(&fresh).unwrap().unwrap().version, DEFAULT_VERSION);

        let decoded = codec.decode(&mut Cursor::new(out)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_console_encode_unsupported() {
        let err = WrappedTextureFormat::new(Platform::Xbox360)
            .encode(&image(4, 4), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));
    }
}
