//! DDS (`DirectDraw` Surface) textures
//!
//! Decodes BC1/BC2/BC3/BC7 and common uncompressed layouts to BGRA. Encodes to
//! DXT1 or DXT5 with a full mip chain.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`, 2015 Norbyte (`LSLib`, MIT)
//!
//! SPDX-License-Identifier: MIT

mod decode;
mod encode;

use std::io::Write;

use ddsfile::Dds;

use super::{ImageFormat, ImageMetadata, PixelFormat, RawImageData};
use crate::error::{Error, Result};
use crate::utils::ReadSeek;

/// DDS magic, `"DDS "`
pub const MAGIC: [u8; 4] = *b"DDS ";

/// DDS codec
#[derive(Debug, Clone, Copy)]
pub struct DdsImageFormat {
    /// Generate a full mip chain on encode
    pub mipmaps: bool,
}

impl Default for DdsImageFormat {
    fn default() -> Self {
        Self { mipmaps: true }
    }
}

impl DdsImageFormat {
    fn read(reader: &mut dyn ReadSeek) -> Result<Dds> {
        Dds::read(reader).map_err(|e| Error::decode("DDS", format!("failed to parse DDS: {e}")))
    }

    fn encoding(dds: &Dds) -> String {
        if let Some(d3d) = dds.get_d3d_format() {
            format!("{d3d:?}")
        } else if let Some(dxgi) = dds.get_dxgi_format() {
            format!("{dxgi:?}")
        } else {
            "unknown".to_string()
        }
    }
}

impl ImageFormat for DdsImageFormat {
    fn id(&self) -> &'static str {
        "dds"
    }

    fn name(&self) -> &'static str {
        "DDS"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["dds"]
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        let dds = Self::read(reader)?;
        Ok(ImageMetadata::new(
            dds.get_width(),
            dds.get_height(),
            dds.get_num_mipmap_levels().saturating_sub(1),
            Self::encoding(&dds),
        ))
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let dds = Self::read(reader)?;
        let rgba = decode::decode_dds_to_rgba(&dds)?;
        RawImageData::from_rgba(dds.get_width(), dds.get_height(), rgba, true)
    }

    fn encode(&self, image: &RawImageData, writer: &mut dyn Write) -> Result<ImageMetadata> {
        let rgba = image.convert(PixelFormat::Bgra32).to_rgba_image()?;
        let (bytes, mipmaps_count, format) = encode::encode_to_dds(&rgba, self.mipmaps)?;
        writer.write_all(&bytes)?;
        Ok(ImageMetadata::new(
            image.width(),
            image.height(),
            mipmaps_count,
            format!("{format:?}"),
        ))
    }
}
