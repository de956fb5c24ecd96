//! SPDX-FileCopyrightText: 2025 CyberDeco, 2015 Norbyte (LSLib, MIT)
//!
//! SPDX-License-Identifier: MIT
//!
//! DDS decoding to RGBA, base level only

use ddsfile::{D3DFormat, Dds, DxgiFormat};

use crate::error::{Error, Result};
use crate::image::bc::{BcFormat, decode_blocks};

/// How the base level of a DDS is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DdsLayout {
    Block(BcFormat),
    /// Uncompressed, with byte positions of R, G, B and optionally A
    Linear {
        bytes_per_pixel: usize,
        rgba: [usize; 3],
        alpha: Option<usize>,
    },
}

impl DdsLayout {
    const BGRA: Self = Self::Linear {
        bytes_per_pixel: 4,
        rgba: [2, 1, 0],
        alpha: Some(3),
    };
    const BGRX: Self = Self::Linear {
        bytes_per_pixel: 4,
        rgba: [2, 1, 0],
        alpha: None,
    };
    const RGBA: Self = Self::Linear {
        bytes_per_pixel: 4,
        rgba: [0, 1, 2],
        alpha: Some(3),
    };
    const BGR: Self = Self::Linear {
        bytes_per_pixel: 3,
        rgba: [2, 1, 0],
        alpha: None,
    };

    pub(super) fn of(dds: &Dds) -> Result<Self> {
        if let Some(dxgi) = dds.get_dxgi_format() {
            dxgi_layout(dxgi)
        } else if let Some(d3d) = dds.get_d3d_format() {
            d3d_layout(d3d)
        } else {
            Err(Error::decode("DDS", "unknown pixel format"))
        }
    }
}

fn dxgi_layout(format: DxgiFormat) -> Result<DdsLayout> {
    Ok(match format {
        DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => DdsLayout::RGBA,
        DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => DdsLayout::BGRA,
        DxgiFormat::B8G8R8X8_UNorm | DxgiFormat::B8G8R8X8_UNorm_sRGB => DdsLayout::BGRX,
        DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => DdsLayout::Block(BcFormat::Bc1),
        DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => DdsLayout::Block(BcFormat::Bc2),
        DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => DdsLayout::Block(BcFormat::Bc3),
        DxgiFormat::BC7_UNorm | DxgiFormat::BC7_UNorm_sRGB => DdsLayout::Block(BcFormat::Bc7),
        _ => return Err(Error::decode("DDS", format!("unsupported DXGI format {format:?}"))),
    })
}

fn d3d_layout(format: D3DFormat) -> Result<DdsLayout> {
    Ok(match format {
        // Little-endian ARGB words are B, G, R, A in memory
        D3DFormat::A8R8G8B8 => DdsLayout::BGRA,
        D3DFormat::X8R8G8B8 => DdsLayout::BGRX,
        D3DFormat::A8B8G8R8 => DdsLayout::RGBA,
        D3DFormat::R8G8B8 => DdsLayout::BGR,
        D3DFormat::DXT1 => DdsLayout::Block(BcFormat::Bc1),
        D3DFormat::DXT2 | D3DFormat::DXT3 => DdsLayout::Block(BcFormat::Bc2),
        D3DFormat::DXT4 | D3DFormat::DXT5 => DdsLayout::Block(BcFormat::Bc3),
        _ => return Err(Error::decode("DDS", format!("unsupported D3D format {format:?}"))),
    })
}

/// Decode the base level of `dds` to RGBA pixels
pub(super) fn decode_dds_to_rgba(dds: &Dds) -> Result<Vec<u8>> {
    let width = dds.get_width() as usize;
    let height = dds.get_height() as usize;
    let data = dds
        .get_data(0)
        .map_err(|e| Error::decode("DDS", format!("no surface data: {e}")))?;

    match DdsLayout::of(dds)? {
        DdsLayout::Block(format) => decode_blocks(data, width, height, format),
        DdsLayout::Linear {
            bytes_per_pixel,
            rgba,
            alpha,
        } => {
            let base = width * height * bytes_per_pixel;
            let Some(level) = data.get(..base) else {
                return Err(Error::decode(
                    "DDS",
                    format!("base level needs {base} bytes, found {}", data.len()),
                ));
            };
            let mut out = Vec::with_capacity(width * height * 4);
            for px in level.chunks_exact(bytes_per_pixel) {
                out.extend_from_slice(&[
                    px[rgba[0]],
                    px[rgba[1]],
                    px[rgba[2]],
                    alpha.map_or(0xFF, |a| px[a]),
                ]);
            }
            Ok(out)
        }
    }
}
