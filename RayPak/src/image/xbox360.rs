//! Xbox 360 cooked textures (decode only)
//!
//! A 16-byte big-endian header followed by texture data that is usually tiled.
//! DXT data is stored as big-endian 16-bit words; 8888 data is stored as
//! big-endian ARGB words and needs no swap.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use super::bc::{BcFormat, decode_blocks};
use super::swizzle::{swap_bytes_16, xbox360_untile};
use super::{ImageFormat, ImageMetadata, RawImageData};
use crate::error::{Error, Result};
use crate::utils::ReadSeek;
use crate::utils::binary::read_exact_vec;

pub const HEADER_SIZE: u32 = 16;

/// GPU texture formats found in cooked Xbox 360 textures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuFormat {
    Argb8888,
    Dxt1,
    Dxt2_3,
    Dxt4_5,
}

impl GpuFormat {
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            6 => Ok(Self::Argb8888),
            18 => Ok(Self::Dxt1),
            19 => Ok(Self::Dxt2_3),
            20 => Ok(Self::Dxt4_5),
            _ => Err(Error::unsupported("Xbox 360 texture", format!("GPU format {code}"))),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Argb8888 => 6,
            Self::Dxt1 => 18,
            Self::Dxt2_3 => 19,
            Self::Dxt4_5 => 20,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Argb8888 => "8_8_8_8",
            Self::Dxt1 => "DXT1",
            Self::Dxt2_3 => "DXT2_3",
            Self::Dxt4_5 => "DXT4_5",
        }
    }

    fn block_format(self) -> Option<BcFormat> {
        match self {
            Self::Argb8888 => None,
            Self::Dxt1 => Some(BcFormat::Bc1),
            Self::Dxt2_3 => Some(BcFormat::Bc2),
            Self::Dxt4_5 => Some(BcFormat::Bc3),
        }
    }
}

/// Fixed texture header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xbox360Header {
    pub width: u16,
    pub height: u16,
    pub gpu_format: u8,
    pub mipmaps_count: u8,
    pub tiled: bool,
    pub data_size: u32,
}

impl Xbox360Header {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let header_size = reader.read_u32::<BigEndian>()?;
        if header_size != HEADER_SIZE {
            return Err(Error::decode(
                "Xbox 360 texture",
                format!("header size {header_size}, expected {HEADER_SIZE}"),
            ));
        }
        let header = Self {
            width: reader.read_u16::<BigEndian>()?,
            height: reader.read_u16::<BigEndian>()?,
            gpu_format: reader.read_u8()?,
            mipmaps_count: reader.read_u8()?,
            tiled: reader.read_u8()? != 0,
            data_size: {
                let _reserved = reader.read_u8()?;
                reader.read_u32::<BigEndian>()?
            },
        };
        if header.width == 0 || header.height == 0 {
            return Err(Error::decode("Xbox 360 texture", "zero texture dimension"));
        }
        Ok(header)
    }
}

/// Xbox 360 texture codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Xbox360ImageFormat;

impl ImageFormat for Xbox360ImageFormat {
    fn id(&self) -> &'static str {
        "xbox360"
    }

    fn name(&self) -> &'static str {
        "Xbox 360 texture"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn can_encode(&self) -> bool {
        false
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        let header = Xbox360Header::read(reader)?;
        let encoding = GpuFormat::from_code(header.gpu_format)
            .map_or_else(|_| format!("GPU format {}", header.gpu_format), |f| f.as_str().to_string());
        Ok(ImageMetadata::new(
            u32::from(header.width),
            u32::from(header.height),
            u32::from(header.mipmaps_count),
            encoding,
        ))
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let header = Xbox360Header::read(reader)?;
        let format = GpuFormat::from_code(header.gpu_format)?;
        reader.seek(SeekFrom::Start(u64::from(HEADER_SIZE)))?;
        let mut data = read_exact_vec(reader, header.data_size as usize)?;

        let width = usize::from(header.width);
        let height = usize::from(header.height);
        let rgba = if let Some(block_format) = format.block_format() {
            swap_bytes_16(&mut data);
            let (bw, bh) = (width.div_ceil(4), height.div_ceil(4));
            let blocks = if header.tiled {
                xbox360_untile(&data, bw, bh, block_format.block_size())?
            } else {
                data
            };
            decode_blocks(&blocks, width, height, block_format)?
        } else {
            let argb = if header.tiled {
                xbox360_untile(&data, width, height, 4)?
            } else {
                data.get(..width * height * 4)
                    .ok_or_else(|| Error::decode("Xbox 360 texture", "pixel data shorter than the texture"))?
                    .to_vec()
            };
            argb.chunks_exact(4).flat_map(|p| [p[1], p[2], p[3], p[0]]).collect()
        };

        RawImageData::from_rgba(u32::from(header.width), u32::from(header.height), rgba, true)
    }
}
