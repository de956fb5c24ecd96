//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Block compression: BC1/BC2/BC3/BC7 decoding through `bcdec_rs`, BC1/BC3 encoding

use crate::error::{Error, Result};

/// Block-compressed pixel formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BcFormat {
    Bc1, // DXT1 - 8 bytes per 4x4 block
    Bc2, // DXT3 - explicit 4-bit alpha
    Bc3, // DXT5 - interpolated alpha
    Bc7,
}

impl BcFormat {
    /// Block size in bytes for this format
    pub(crate) const fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc2 | Self::Bc3 | Self::Bc7 => 16,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Bc1 => "BC1",
            Self::Bc2 => "BC2",
            Self::Bc3 => "BC3",
            Self::Bc7 => "BC7",
        }
    }

    /// Byte size of one level of `width` x `height` pixels
    pub(crate) fn level_size(self, width: usize, height: usize) -> usize {
        width.div_ceil(4) * height.div_ceil(4) * self.block_size()
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one level of block data to RGBA
pub(crate) fn decode_blocks(data: &[u8], width: usize, height: usize, format: BcFormat) -> Result<Vec<u8>> {
    let required = format.level_size(width, height);
    if data.len() < required {
        return Err(Error::decode(
            format.as_str(),
            format!("need {required} bytes of block data, found {}", data.len()),
        ));
    }

    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();

    // 4 pixels * 4 bytes per decoded row
    let mut block_rgba = [0u8; 64];
    let block_pitch = 16;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block_idx = (by * blocks_x + bx) * block_size;
            let block = &data[block_idx..block_idx + block_size];

            match format {
                BcFormat::Bc1 => bcdec_rs::bc1(block, &mut block_rgba, block_pitch),
                BcFormat::Bc2 => bcdec_rs::bc2(block, &mut block_rgba, block_pitch),
                BcFormat::Bc3 => bcdec_rs::bc3(block, &mut block_rgba, block_pitch),
                BcFormat::Bc7 => bcdec_rs::bc7(block, &mut block_rgba, block_pitch),
            }

            for py in 0..4 {
                for px in 0..4 {
                    let fx = bx * 4 + px;
                    let fy = by * 4 + py;
                    if fx >= width || fy >= height {
                        continue;
                    }
                    let src_idx = (py * 4 + px) * 4;
                    let dst_idx = (fy * width + fx) * 4;
                    rgba[dst_idx..dst_idx + 4].copy_from_slice(&block_rgba[src_idx..src_idx + 4]);
                }
            }
        }
    }

    Ok(rgba)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode RGBA pixels as BC1 (opaque)
pub(crate) fn encode_bc1(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    encode_with(pixels, width, height, 8, |block, out| {
        out.copy_from_slice(&encode_color_block(block));
    })
}

/// Encode RGBA pixels as BC3 (interpolated alpha)
pub(crate) fn encode_bc3(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    encode_with(pixels, width, height, 16, |block, out| {
        out[..8].copy_from_slice(&encode_alpha_block(block));
        out[8..].copy_from_slice(&encode_color_block(block));
    })
}

fn encode_with<F>(pixels: &[u8], width: usize, height: usize, block_size: usize, encode: F) -> Vec<u8>
where
    F: Fn(&[[u8; 4]; 16], &mut [u8]),
{
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut output = vec![0u8; blocks_x * blocks_y * block_size];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(pixels, width, height, bx * 4, by * 4);
            let offset = (by * blocks_x + bx) * block_size;
            encode(&block, &mut output[offset..offset + block_size]);
        }
    }

    output
}

/// Extract a 4x4 block of RGBA pixels, padding with edge pixels if needed
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];

    for py in 0..4 {
        for px in 0..4 {
            let sx = (x + px).min(width - 1);
            let sy = (y + py).min(height - 1);
            let src_idx = (sy * width + sx) * 4;
            block[py * 4 + px].copy_from_slice(&pixels[src_idx..src_idx + 4]);
        }
    }

    block
}

/// Encode the colour half of a block in four-colour mode
fn encode_color_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let (max, min) = find_endpoint_colors(block);
    let (c0, c1) = if max >= min { (max, min) } else { (min, max) };

    let mut indices: u32 = 0;
    if c0 != c1 {
        let palette = color_palette(c0, c1);
        for (i, pixel) in block.iter().enumerate() {
            let best_idx = find_closest_color(pixel, &palette);
            indices |= u32::from(best_idx) << (i * 2);
        }
    }
    // Equal endpoints: every pixel takes index 0, which decodes to c0 in either mode

    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

/// Encode the alpha half of a BC3 block
fn encode_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let a0 = block.iter().map(|p| p[3]).max().unwrap_or(255);
    let a1 = block.iter().map(|p| p[3]).min().unwrap_or(255);

    let lerp = |w0: u16, w1: u16, d: u16| ((w0 * u16::from(a0) + w1 * u16::from(a1)) / d) as u8;
    let alphas = if a0 > a1 {
        [a0, a1, lerp(6, 1, 7), lerp(5, 2, 7), lerp(4, 3, 7), lerp(3, 4, 7), lerp(2, 5, 7), lerp(1, 6, 7)]
    } else {
        [a0, a1, lerp(4, 1, 5), lerp(3, 2, 5), lerp(2, 3, 5), lerp(1, 4, 5), 0, 255]
    };

    let mut indices: u64 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let best_idx = alphas
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| (i32::from(pixel[3]) - i32::from(**a)).abs())
            .map_or(0, |(j, _)| j as u64);
        indices |= best_idx << (i * 3);
    }

    let mut output = [0u8; 8];
    output[0] = a0;
    output[1] = a1;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}

/// Brightest and darkest pixels of a block, as RGB565
fn find_endpoint_colors(block: &[[u8; 4]; 16]) -> (u16, u16) {
    let luminance = |p: &&[u8; 4]| u32::from(p[0]) + u32::from(p[1]) + u32::from(p[2]);
    let max = block.iter().max_by_key(luminance).unwrap_or(&block[0]);
    let min = block.iter().min_by_key(luminance).unwrap_or(&block[0]);
    (rgb_to_565(max[0], max[1], max[2]), rgb_to_565(min[0], min[1], min[2]))
}

/// Convert RGB888 to RGB565 with rounding
pub(crate) fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let quantize = |v: u8, max: u16| (u16::from(v) * max + 127) / 255;
    (quantize(r, 31) << 11) | (quantize(g, 63) << 5) | quantize(b, 31)
}

/// Expand RGB565 the way block decoders do
fn rgb_from_565(c: u16) -> [u16; 3] {
    let r = ((c >> 11) & 0x1F) * 527 + 23;
    let g = ((c >> 5) & 0x3F) * 259 + 33;
    let b = (c & 0x1F) * 527 + 23;
    [r >> 6, g >> 6, b >> 6]
}

/// Four-colour palette for endpoints `c0 > c1`
fn color_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let e0 = rgb_from_565(c0);
    let e1 = rgb_from_565(c1);
    let mut palette = [[0u8; 3]; 4];
    for ch in 0..3 {
        palette[0][ch] = e0[ch] as u8;
        palette[1][ch] = e1[ch] as u8;
        palette[2][ch] = ((2 * e0[ch] + e1[ch]) / 3) as u8;
        palette[3][ch] = ((e0[ch] + 2 * e1[ch]) / 3) as u8;
    }
    palette
}

fn find_closest_color(pixel: &[u8; 4], palette: &[[u8; 3]; 4]) -> u8 {
    let distance = |color: &[u8; 3]| -> i32 {
        (0..3)
            .map(|ch| {
                let d = i32::from(pixel[ch]) - i32::from(color[ch]);
                d * d
            })
            .sum()
    };
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, color)| distance(color))
        .map_or(0, |(i, _)| i as u8)
}
