//! Console texture layouts: PS Vita Morton order, Xbox 360 tiling, 16-bit byte swap
//!
//! All functions work on a grid of fixed-size elements, which are either
//! pixels or 4x4 compressed blocks depending on the texture format.

use crate::error::{Error, Result};

// ============================================================================
// Morton order (PS Vita)
// ============================================================================

/// Morton index of `(x, y)` on a `width` x `height` power-of-two grid.
///
/// Bits of x and y are interleaved (x first) while both dimensions still have
/// bits; the leftover bits of the longer dimension follow.
fn morton_index(x: usize, y: usize, width: usize, height: usize) -> usize {
    let mut index = 0;
    let mut shift = 0;
    let mut bit = 1;
    while bit < width || bit < height {
        if bit < width {
            index |= usize::from(x & bit != 0) << shift;
            shift += 1;
        }
        if bit < height {
            index |= usize::from(y & bit != 0) << shift;
            shift += 1;
        }
        bit <<= 1;
    }
    index
}

/// Reorder Morton-swizzled elements into row-major order
pub fn morton_unswizzle(data: &[u8], width: usize, height: usize, elem_bytes: usize) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }
    let grid_w = width.next_power_of_two();
    let grid_h = height.next_power_of_two();

    // Morton order is monotone in x and y, so the last element has the highest index
    let required = (morton_index(width - 1, height - 1, grid_w, grid_h) + 1) * elem_bytes;
    if data.len() < required {
        return Err(Error::decode(
            "swizzled texture",
            format!("{width}x{height} needs {required} bytes, found {}", data.len()),
        ));
    }

    let mut output = vec![0u8; width * height * elem_bytes];
    for y in 0..height {
        for x in 0..width {
            let src = morton_index(x, y, grid_w, grid_h) * elem_bytes;
            let dst = (y * width + x) * elem_bytes;
            output[dst..dst + elem_bytes].copy_from_slice(&data[src..src + elem_bytes]);
        }
    }

    Ok(output)
}

/// Inverse of [`morton_unswizzle`], padding to the power-of-two grid
#[must_use]
pub fn morton_swizzle(data: &[u8], width: usize, height: usize, elem_bytes: usize) -> Vec<u8> {
    let grid_w = width.next_power_of_two();
    let grid_h = height.next_power_of_two();
    let mut output = vec![0u8; grid_w * grid_h * elem_bytes];

    for y in 0..height {
        for x in 0..width {
            let dst = morton_index(x, y, grid_w, grid_h) * elem_bytes;
            let src = (y * width + x) * elem_bytes;
            output[dst..dst + elem_bytes].copy_from_slice(&data[src..src + elem_bytes]);
        }
    }

    output
}

// ============================================================================
// Xbox 360 tiling
// ============================================================================

const TILE_ALIGN: usize = 32;

fn log_bpp(texel_pitch: usize) -> usize {
    (texel_pitch >> 2) + ((texel_pitch >> 1) >> (texel_pitch >> 2))
}

/// X coordinate of the element at tiled `offset` (XGAddress2DTiledX)
fn tiled_x(offset: usize, width: usize, texel_pitch: usize) -> usize {
    let aligned_width = (width + 31) & !31;
    let log_bpp = log_bpp(texel_pitch);
    let offset_b = offset << log_bpp;
    let offset_t = ((offset_b & !4095) >> 3) + ((offset_b & 1792) >> 2) + (offset_b & 63);
    let offset_m = offset_t >> (7 + log_bpp);

    let macro_x = (offset_m % (aligned_width >> 5)) << 2;
    let tile = (((offset_t >> (5 + log_bpp)) & 2) + (offset_b >> 6)) & 3;
    let macro_ = (macro_x + tile) << 3;
    let micro = ((((offset_t >> 1) & !15) + (offset_t & 15)) & ((texel_pitch << 3) - 1)) >> log_bpp;

    macro_ + micro
}

/// Y coordinate of the element at tiled `offset` (XGAddress2DTiledY)
fn tiled_y(offset: usize, width: usize, texel_pitch: usize) -> usize {
    let aligned_width = (width + 31) & !31;
    let log_bpp = log_bpp(texel_pitch);
    let offset_b = offset << log_bpp;
    let offset_t = ((offset_b & !4095) >> 3) + ((offset_b & 1792) >> 2) + (offset_b & 63);
    let offset_m = offset_t >> (7 + log_bpp);

    let macro_y = (offset_m / (aligned_width >> 5)) << 2;
    let tile = ((offset_t >> (6 + log_bpp)) & 1) + ((offset_b & 2048) >> 10);
    let macro_ = (macro_y + tile) << 3;
    let micro = (((offset_t & (((texel_pitch << 6) - 1) & !31)) + ((offset_t & 15) << 1)) >> (3 + log_bpp)) & !1;

    macro_ + micro + ((offset_t & 16) >> 4)
}

/// Untile Xbox 360 texture data into row-major order.
///
/// The tiled data covers a grid aligned to 32 elements in both directions;
/// elements outside `width` x `height` are dropped.
pub fn xbox360_untile(data: &[u8], width: usize, height: usize, texel_pitch: usize) -> Result<Vec<u8>> {
    let aligned_w = width.next_multiple_of(TILE_ALIGN);
    let aligned_h = height.next_multiple_of(TILE_ALIGN);
    let required = aligned_w * aligned_h * texel_pitch;
    if data.len() < required {
        return Err(Error::decode(
            "Xbox 360 texture",
            format!("tiled data needs {required} bytes, found {}", data.len()),
        ));
    }

    let mut output = vec![0u8; width * height * texel_pitch];
    for offset in 0..aligned_w * aligned_h {
        let x = tiled_x(offset, aligned_w, texel_pitch);
        let y = tiled_y(offset, aligned_w, texel_pitch);
        if x >= width || y >= height {
            continue;
        }
        let src = offset * texel_pitch;
        let dst = (y * width + x) * texel_pitch;
        output[dst..dst + texel_pitch].copy_from_slice(&data[src..src + texel_pitch]);
    }

    Ok(output)
}

/// Inverse of [`xbox360_untile`], padding to the aligned grid
#[must_use]
pub fn xbox360_tile(data: &[u8], width: usize, height: usize, texel_pitch: usize) -> Vec<u8> {
    let aligned_w = width.next_multiple_of(TILE_ALIGN);
    let aligned_h = height.next_multiple_of(TILE_ALIGN);

    let mut output = vec![0u8; aligned_w * aligned_h * texel_pitch];
    for offset in 0..aligned_w * aligned_h {
        let x = tiled_x(offset, aligned_w, texel_pitch);
        let y = tiled_y(offset, aligned_w, texel_pitch);
        if x >= width || y >= height {
            continue;
        }
        let src = (y * width + x) * texel_pitch;
        let dst = offset * texel_pitch;
        output[dst..dst + texel_pitch].copy_from_slice(&data[src..src + texel_pitch]);
    }

    output
}

/// Swap the bytes of every 16-bit word in place
pub(crate) fn swap_bytes_16(data: &mut [u8]) {
    for pair in data.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}
