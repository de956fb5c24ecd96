//! PS Vita GXT textures (decode only)
//!
//! Little-endian container holding one or more textures. Only the first one is
//! decoded. Swizzled textures are stored in Morton order over pixels, or over
//! 4x4 blocks for the UBC formats.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::bc::{BcFormat, decode_blocks};
use super::swizzle::morton_unswizzle;
use super::{ImageFormat, ImageMetadata, RawImageData};
use crate::error::{Error, Result};
use crate::utils::ReadSeek;
use crate::utils::binary::read_exact_vec;

pub const MAGIC: [u8; 4] = *b"GXT\0";

const TYPE_SWIZZLED: u32 = 0x0000_0000;
const TYPE_LINEAR: u32 = 0x6000_0000;

const FORMAT_UBC1: u32 = 0x85 << 24;
const FORMAT_UBC2: u32 = 0x86 << 24;
const FORMAT_UBC3: u32 = 0x87 << 24;
const FORMAT_ABGR8888: u32 = 0x0C00_0000;
const FORMAT_ARGB8888: u32 = 0x0C00_1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GxtPixels {
    Block(BcFormat),
    /// 32-bit little-endian words, R G B A in memory
    Rgba8888,
    /// 32-bit little-endian words, B G R A in memory
    Bgra8888,
}

impl GxtPixels {
    fn from_code(code: u32) -> Result<Self> {
        match code {
            FORMAT_UBC1 => Ok(Self::Block(BcFormat::Bc1)),
            FORMAT_UBC2 => Ok(Self::Block(BcFormat::Bc2)),
            FORMAT_UBC3 => Ok(Self::Block(BcFormat::Bc3)),
            FORMAT_ABGR8888 => Ok(Self::Rgba8888),
            FORMAT_ARGB8888 => Ok(Self::Bgra8888),
            _ => Err(Error::unsupported("GXT", format!("texture format {code:#010x}"))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Block(format) => format.as_str(),
            Self::Rgba8888 => "U8U8U8U8_ABGR",
            Self::Bgra8888 => "U8U8U8U8_ARGB",
        }
    }
}

/// Descriptor of one texture in a GXT file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GxtTextureInfo {
    pub data_offset: u32,
    pub data_size: u32,
    pub palette_index: i32,
    pub flags: u32,
    pub texture_type: u32,
    pub texture_format: u32,
    pub width: u16,
    pub height: u16,
    pub mip_count: u16,
}

impl GxtTextureInfo {
    /// Read the container header and the first texture descriptor
    pub fn read_first<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::decode("GXT", format!("bad magic {magic:02x?}")));
        }
        let _version = reader.read_u32::<LittleEndian>()?;
        let texture_count = reader.read_u32::<LittleEndian>()?;
        if texture_count == 0 {
            return Err(Error::decode("GXT", "no textures"));
        }
        // Container data offset/size and palette counts
        for _ in 0..5 {
            reader.read_u32::<LittleEndian>()?;
        }

        let info = Self {
            data_offset: reader.read_u32::<LittleEndian>()?,
            data_size: reader.read_u32::<LittleEndian>()?,
            palette_index: reader.read_i32::<LittleEndian>()?,
            flags: reader.read_u32::<LittleEndian>()?,
            texture_type: reader.read_u32::<LittleEndian>()?,
            texture_format: reader.read_u32::<LittleEndian>()?,
            width: reader.read_u16::<LittleEndian>()?,
            height: reader.read_u16::<LittleEndian>()?,
            mip_count: reader.read_u16::<LittleEndian>()?,
        };
        if info.width == 0 || info.height == 0 {
            return Err(Error::decode("GXT", "zero texture dimension"));
        }
        Ok(info)
    }
}

/// GXT codec
#[derive(Debug, Clone, Copy, Default)]
pub struct GxtImageFormat;

impl ImageFormat for GxtImageFormat {
    fn id(&self) -> &'static str {
        "gxt"
    }

    fn name(&self) -> &'static str {
        "GXT"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["gxt"]
    }

    fn can_encode(&self) -> bool {
        false
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        let info = GxtTextureInfo::read_first(reader)?;
        let encoding = GxtPixels::from_code(info.texture_format)
            .map_or_else(|_| format!("{:#010x}", info.texture_format), |p| p.as_str().to_string());
        Ok(ImageMetadata::new(
            u32::from(info.width),
            u32::from(info.height),
            u32::from(info.mip_count.saturating_sub(1)),
            encoding,
        ))
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let info = GxtTextureInfo::read_first(reader)?;
        let pixels = GxtPixels::from_code(info.texture_format)?;
        let swizzled = match info.texture_type {
            TYPE_SWIZZLED => true,
            TYPE_LINEAR => false,
            other => return Err(Error::unsupported("GXT", format!("texture type {other:#010x}"))),
        };

        reader.seek(SeekFrom::Start(u64::from(info.data_offset)))?;
        let data = read_exact_vec(reader, info.data_size as usize)?;

        let width = usize::from(info.width);
        let height = usize::from(info.height);
        let rgba = match pixels {
            GxtPixels::Block(format) => {
                let (bw, bh) = (width.div_ceil(4), height.div_ceil(4));
                let blocks = if swizzled {
                    morton_unswizzle(&data, bw, bh, format.block_size())?
                } else {
                    data
                };
                decode_blocks(&blocks, width, height, format)?
            }
            GxtPixels::Rgba8888 | GxtPixels::Bgra8888 => {
                let mut linear = if swizzled {
                    morton_unswizzle(&data, width, height, 4)?
                } else {
                    data.get(..width * height * 4)
                        .ok_or_else(|| Error::decode("GXT", "pixel data shorter than the texture"))?
                        .to_vec()
                };
                if pixels == GxtPixels::Bgra8888 {
                    for px in linear.chunks_exact_mut(4) {
                        px.swap(0, 2);
                    }
                }
                linear
            }
        };

        RawImageData::from_rgba(u32::from(info.width), u32::from(info.height), rgba, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelFormat;
    use crate::image::bc::encode_bc1;
    use crate::image::swizzle::morton_swizzle;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn gxt(texture_type: u32, format: u32, width: u16, height: u16, data: &[u8]) -> Vec<u8> {
        let data_offset = 0x40u32;
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        for value in [0x1000_0003, 1, data_offset, data.len() as u32, 0, 0, 0] {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
        for value in [data_offset, data.len() as u32] {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
        out.write_i32::<LittleEndian>(-1).unwrap();
        for value in [0, texture_type, format] {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
        for value in [width, height, 1, 0] {
            out.write_u16::<LittleEndian>(value).unwrap();
        }
        assert_eq!(out.len(), 0x40);
        out.extend_from_slice(data);
        out
    }

    fn rgba_pattern(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| [i as u8, (i * 3) as u8, 200, 255 - i as u8])
            .collect()
    }

    #[test]
    fn test_swizzled_abgr() {
        let rgba = rgba_pattern(8, 4);
        let file = gxt(TYPE_SWIZZLED, FORMAT_ABGR8888, 8, 4, &morton_swizzle(&rgba, 8, 4, 4));

        let image = GxtImageFormat.decode(&mut Cursor::new(file)).unwrap();
        assert_eq!(image.format(), PixelFormat::Bgra32);
        assert_eq!(image.to_rgba(), rgba);
    }

    #[test]
    fn test_linear_argb() {
        let rgba = rgba_pattern(3, 2);
        let bgra: Vec<u8> = rgba.chunks_exact(4).flat_map(|p| [p[2], p[1], p[0], p[3]]).collect();
        let file = gxt(TYPE_LINEAR, FORMAT_ARGB8888, 3, 2, &bgra);

        let image = GxtImageFormat.decode(&mut Cursor::new(file)).unwrap();
        assert_eq!(image.data(), bgra.as_slice());
    }

    #[test]
    fn test_swizzled_blocks() {
        let rgba: Vec<u8> = (0..16 * 8)
            .flat_map(|i| {
                let block = ((i % 16) / 4 + (i / 16) / 4 * 4) as u8;
                [block * 30, 255 - block * 20, 16, 255]
            })
            .collect();
        let blocks = encode_bc1(&rgba, 16, 8);
        let expected = decode_blocks(&blocks, 16, 8, BcFormat::Bc1).unwrap();
        let file = gxt(TYPE_SWIZZLED, FORMAT_UBC1, 16, 8, &morton_swizzle(&blocks, 4, 2, 8));

        let codec = GxtImageFormat;
        let meta = codec.get_metadata(&mut Cursor::new(file.clone())).unwrap();
        assert_eq!((meta.width, meta.height, meta.encoding.as_str()), (16, 8, "BC1"));

        let image = codec.decode(&mut Cursor::new(file)).unwrap();
        assert_eq!(image.to_rgba(), expected);
    }

    #[test]
    fn test_unsupported_type_and_encode() {
        let file = gxt(0x4000_0000, FORMAT_ABGR8888, 4, 4, &[0; 64]);
        let err = GxtImageFormat.decode(&mut Cursor::new(file)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { .. }));

        let image = RawImageData::new(1, 1, PixelFormat::Bgr24, vec![0; 3]).unwrap();
        assert!(matches!(
            GxtImageFormat.encode(&image, &mut Vec::new()),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_oversized_dimensions_with_short_payload() {
        for format in [FORMAT_ABGR8888, FORMAT_UBC1] {
            let file = gxt(TYPE_SWIZZLED, format, u16::MAX, u16::MAX, &[0; 40]);
            let err = GxtImageFormat.decode(&mut Cursor::new(file)).unwrap_err();
            assert!(matches!(err, Error::CodecDecode { .. }), "{format:#x}");
        }
    }

    #[test]
    fn test_bad_magic() {
        let err = GxtImageFormat.decode(&mut Cursor::new(b"GXZ\0padding".to_vec())).unwrap_err();
        assert!(err.is_codec_error());
    }
}
