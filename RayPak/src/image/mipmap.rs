//! Mipmap chain generation

use image::RgbaImage;

/// Number of levels in a full chain down to 1x1, base included
#[must_use]
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Build the full mipmap chain down to 1x1, base level first.
///
/// Each level is a 2x2 box filter of the previous one. Colour and alpha are
/// averaged separately so transparent texels keep their colour.
#[must_use]
pub fn generate_mipmaps(base: &RgbaImage) -> Vec<RgbaImage> {
    let mut levels = Vec::with_capacity(mip_level_count(base.width(), base.height()) as usize);
    levels.push(base.clone());

    loop {
        let current = &levels[levels.len() - 1];
        let (width, height) = current.dimensions();
        if width <= 1 && height <= 1 {
            break;
        }
        let next = downsample(current);
        levels.push(next);
    }

    levels
}

fn downsample(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let next_w = (width / 2).max(1);
    let next_h = (height / 2).max(1);

    RgbaImage::from_fn(next_w, next_h, |x, y| {
        let x0 = (x * 2).min(width - 1);
        let x1 = (x * 2 + 1).min(width - 1);
        let y0 = (y * 2).min(height - 1);
        let y1 = (y * 2 + 1).min(height - 1);

        let mut sum = [0u32; 4];
        for (sx, sy) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
            let px = image.get_pixel(sx, sy);
            for (acc, v) in sum.iter_mut().zip(px.0) {
                *acc += u32::from(v);
            }
        }
        image::Rgba(sum.map(|s| ((s + 2) / 4) as u8))
    })
}
