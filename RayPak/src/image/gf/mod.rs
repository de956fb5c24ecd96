//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! OpenSpace GF packed textures
//!
//! Little-endian header, optional palette, then one run-length coded byte
//! plane per channel. Each plane covers the base level followed by every mip
//! level; rows are stored bottom to top.

mod format;
mod palette;
mod rle;

pub use format::{GfPixelFormat, rescale};

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use image::RgbaImage;

use super::mipmap::generate_mipmaps;
use super::{ImageFormat, ImageMetadata, PixelFormat, RawImageData, flip_rows};
use crate::error::{Error, Result};
use crate::utils::ReadSeek;

/// Largest accepted width or height
pub const MAX_DIMENSION: u32 = 16384;

/// Parsed GF header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfHeader {
    pub format: GfPixelFormat,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub mipmaps_count: u8,
    pub repeat_byte: u8,
    /// B, G, R(, A) entries; empty unless the format is [`GfPixelFormat::Palette`]
    pub palette: Vec<[u8; 4]>,
    pub palette_bpc: u8,
}

impl GfHeader {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let format = GfPixelFormat::from_code(reader.read_u32::<LittleEndian>()?)?;
        let width = reader.read_u32::<LittleEndian>()?;
        let height = reader.read_u32::<LittleEndian>()?;
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(Error::decode("GF", format!("invalid dimensions {width}x{height}")));
        }

        let channels = reader.read_u8()?;
        if channels != format.channels() {
            return Err(Error::decode(
                "GF",
                format!("{} expects {} channels, header says {channels}", format.as_str(), format.channels()),
            ));
        }
        let mipmaps_count = reader.read_u8()?;
        let longest_chain = 32 - width.max(height).leading_zeros();
        if u32::from(mipmaps_count) > longest_chain {
            return Err(Error::decode(
                "GF",
                format!("{mipmaps_count} mip levels exceed the {longest_chain} a {width}x{height} texture has"),
            ));
        }
        let repeat_byte = reader.read_u8()?;

        let mut palette = Vec::new();
        let mut palette_bpc = 0;
        if format == GfPixelFormat::Palette {
            let len = reader.read_u16::<LittleEndian>()?;
            palette_bpc = reader.read_u8()?;
            if !(1..=256).contains(&len) || !matches!(palette_bpc, 3 | 4) {
                return Err(Error::decode(
                    "GF",
                    format!("invalid palette of {len} entries with {palette_bpc} bytes each"),
                ));
            }
            for _ in 0..len {
                let mut entry = [0, 0, 0, 0xFF];
                reader.read_exact(&mut entry[..palette_bpc as usize])?;
                palette.push(entry);
            }
        }

        Ok(Self {
            format,
            width,
            height,
            channels,
            mipmaps_count,
            repeat_byte,
            palette,
            palette_bpc,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.format.code())?;
        writer.write_u32::<LittleEndian>(self.width)?;
        writer.write_u32::<LittleEndian>(self.height)?;
        writer.write_u8(self.channels)?;
        writer.write_u8(self.mipmaps_count)?;
        writer.write_u8(self.repeat_byte)?;
        if self.format == GfPixelFormat::Palette {
            writer.write_u16::<LittleEndian>(self.palette.len() as u16)?;
            writer.write_u8(self.palette_bpc)?;
            for entry in &self.palette {
                writer.write_all(&entry[..self.palette_bpc as usize])?;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha() || (self.format == GfPixelFormat::Palette && self.palette_bpc == 4)
    }

    /// Pixel count of the base level plus every mip level
    #[must_use]
    pub fn total_pixels(&self) -> usize {
        level_sizes(self.width, self.height, u32::from(self.mipmaps_count))
            .map(|(w, h)| w as usize * h as usize)
            .sum()
    }

    fn metadata(&self) -> ImageMetadata {
        ImageMetadata::new(
            self.width,
            self.height,
            u32::from(self.mipmaps_count),
            self.format.as_str(),
        )
    }
}

/// Dimensions of the base level and `mipmaps` further levels
fn level_sizes(width: u32, height: u32, mipmaps: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..=mipmaps).map(move |i| {
        (
            width.checked_shr(i).unwrap_or(0).max(1),
            height.checked_shr(i).unwrap_or(0).max(1),
        )
    })
}

/// GF codec. Encoding options are carried by the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfImageFormat {
    /// Pixel format to encode into; `None` picks 8888 or 888 from the image's alpha
    pub target: Option<GfPixelFormat>,
    /// Store a full mip chain after the base level
    pub mipmaps: bool,
}

impl GfImageFormat {
    #[must_use]
    pub fn with_target(target: GfPixelFormat) -> Self {
        Self {
            target: Some(target),
            mipmaps: false,
        }
    }

    #[must_use]
    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }
}

impl ImageFormat for GfImageFormat {
    fn id(&self) -> &'static str {
        "gf"
    }

    fn name(&self) -> &'static str {
        "GF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["gf"]
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn get_metadata(&self, reader: &mut dyn ReadSeek) -> Result<ImageMetadata> {
        Ok(GfHeader::read(reader)?.metadata())
    }

    fn decode(&self, reader: &mut dyn ReadSeek) -> Result<RawImageData> {
        let header = GfHeader::read(reader)?;
        let total = header.total_pixels();

        let planes = (0..header.channels)
            .map(|_| rle::decode_plane(reader, header.repeat_byte, total))
            .collect::<Result<Vec<_>>>()?;

        // Base level only; mip levels follow it in every plane
        let base = header.width as usize * header.height as usize;
        let mut bgra = Vec::with_capacity(base * 4);
        let mut stored = [0u8; 4];
        for i in 0..base {
            for (c, plane) in planes.iter().enumerate() {
                stored[c] = plane[i];
            }
            let px = if header.format == GfPixelFormat::Palette {
                *header.palette.get(stored[0] as usize).ok_or_else(|| {
                    Error::decode(
                        "GF",
                        format!("palette index {} outside {} entries", stored[0], header.palette.len()),
                    )
                })?
            } else {
                header.format.unpack(&stored)
            };
            bgra.extend_from_slice(&px);
        }

        flip_rows(&mut bgra, header.width as usize * 4);
        let image = RawImageData::new(header.width, header.height, PixelFormat::Bgra32, bgra)?;
        Ok(if header.has_alpha() {
            image
        } else {
            image.convert(PixelFormat::Bgr24)
        })
    }

    fn encode(&self, image: &RawImageData, writer: &mut dyn Write) -> Result<ImageMetadata> {
        let format = self.target.unwrap_or(if image.has_alpha() {
            GfPixelFormat::Argb8888
        } else {
            GfPixelFormat::Rgb888
        });
        if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
            return Err(Error::ImageEncode {
                format: "GF".to_string(),
                message: format!("{}x{} exceeds {MAX_DIMENSION}", image.width(), image.height()),
            });
        }

        let levels: Vec<RgbaImage> = if self.mipmaps {
            generate_mipmaps(&image.to_rgba_image()?)
        } else {
            vec![image.to_rgba_image()?]
        };
        let mipmaps_count = u8::try_from(levels.len() - 1).map_err(|_| Error::ImageEncode {
            format: "GF".to_string(),
            message: format!("{} mip levels do not fit the header", levels.len()),
        })?;

        // Stored order: B, G, R, A with rows bottom to top, level after level
        let mut pixels: Vec<[u8; 4]> = Vec::new();
        for level in &levels {
            let width = level.width() as usize;
            for row in level.as_raw().chunks_exact(width * 4).rev() {
                pixels.extend(row.chunks_exact(4).map(|p| [p[2], p[1], p[0], p[3]]));
            }
        }

        let has_alpha = image.has_alpha();
        let mut stored = Vec::with_capacity(pixels.len() * usize::from(format.channels()));
        let mut palette = Vec::new();
        if format == GfPixelFormat::Palette {
            let indexed = palette::build_palette(&pixels);
            palette = indexed.entries;
            stored = indexed.indices;
        } else {
            for px in &pixels {
                format.pack(*px, &mut stored);
            }
        }

        let channels = usize::from(format.channels());
        let planes: Vec<Vec<u8>> = (0..channels)
            .map(|c| stored.iter().skip(c).step_by(channels).copied().collect())
            .collect();

        let header = GfHeader {
            format,
            width: image.width(),
            height: image.height(),
            channels: format.channels(),
            mipmaps_count,
            repeat_byte: rle::pick_repeat_byte(&planes),
            palette,
            palette_bpc: if has_alpha { 4 } else { 3 },
        };

        let mut output = Vec::new();
        header.write(&mut output)?;
        for plane in &planes {
            rle::encode_plane(plane, header.repeat_byte, &mut output);
        }
        writer.write_all(&output)?;

        Ok(header.metadata())
    }
}
