//! DDS encoding with a full mip chain

use ddsfile::{D3DFormat, Dds, NewD3dParams};
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::image::bc::{encode_bc1, encode_bc3};
use crate::image::mipmap::generate_mipmaps;

fn encode_error(message: String) -> Error {
    Error::ImageEncode {
        format: "DDS".to_string(),
        message,
    }
}

/// Encode `image` as DXT5 when any pixel is translucent, DXT1 otherwise.
///
/// Returns the DDS bytes and the number of mip levels after the base.
pub(super) fn encode_to_dds(image: &RgbaImage, mipmaps: bool) -> Result<(Vec<u8>, u32, D3DFormat)> {
    let has_alpha = image.pixels().any(|p| p.0[3] != 0xFF);
    let format = if has_alpha { D3DFormat::DXT5 } else { D3DFormat::DXT1 };

    let levels = if mipmaps {
        generate_mipmaps(image)
    } else {
        vec![image.clone()]
    };

    let mut data = Vec::new();
    for level in &levels {
        let (w, h) = (level.width() as usize, level.height() as usize);
        let encoded = if has_alpha {
            encode_bc3(level.as_raw(), w, h)
        } else {
            encode_bc1(level.as_raw(), w, h)
        };
        data.extend_from_slice(&encoded);
    }

    let mut dds = Dds::new_d3d(NewD3dParams {
        height: image.height(),
        width: image.width(),
        depth: None,
        format,
        mipmap_levels: Some(levels.len() as u32),
        caps2: None,
    })
    .map_err(|e| encode_error(format!("failed to create DDS: {e}")))?;
    dds.data = data;

    let mut output = Vec::new();
    dds.write(&mut output)
        .map_err(|e| encode_error(format!("failed to write DDS: {e}")))?;

    Ok((output, levels.len() as u32 - 1, format))
}
