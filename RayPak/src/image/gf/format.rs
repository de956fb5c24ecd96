//! GF pixel formats and per-pixel packing

use crate::error::{Error, Result};

/// Pixel encoding stored in a GF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfPixelFormat {
    /// 32-bit B, G, R, A bytes
    Argb8888,
    /// 24-bit B, G, R bytes
    Rgb888,
    /// Gray byte, alpha byte
    GrayAlpha88,
    Gray8,
    /// 16-bit r5 g6 b5
    Rgb565,
    /// 16-bit a1 r5 g5 b5
    Argb1555,
    /// 16-bit a4 r4 g4 b4
    Argb4444,
    /// One palette index byte per pixel
    Palette,
}

impl GfPixelFormat {
    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            8888 => Self::Argb8888,
            888 => Self::Rgb888,
            88 => Self::GrayAlpha88,
            8 => Self::Gray8,
            565 => Self::Rgb565,
            1555 => Self::Argb1555,
            4444 => Self::Argb4444,
            256 => Self::Palette,
            other => return Err(Error::decode("GF", format!("unknown pixel format {other}"))),
        })
    }

    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Argb8888 => 8888,
            Self::Rgb888 => 888,
            Self::GrayAlpha88 => 88,
            Self::Gray8 => 8,
            Self::Rgb565 => 565,
            Self::Argb1555 => 1555,
            Self::Argb4444 => 4444,
            Self::Palette => 256,
        }
    }

    /// Number of byte planes stored for this format
    #[must_use]
    pub fn channels(self) -> u8 {
        match self {
            Self::Argb8888 => 4,
            Self::Rgb888 => 3,
            Self::GrayAlpha88 | Self::Rgb565 | Self::Argb1555 | Self::Argb4444 => 2,
            Self::Gray8 | Self::Palette => 1,
        }
    }

    /// Whether decoded pixels carry alpha. Palettes decide this from their entry size.
    #[must_use]
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Argb8888 | Self::GrayAlpha88 | Self::Argb1555 | Self::Argb4444
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Argb8888 => "ARGB8888",
            Self::Rgb888 => "RGB888",
            Self::GrayAlpha88 => "GrayAlpha88",
            Self::Gray8 => "Gray8",
            Self::Rgb565 => "RGB565",
            Self::Argb1555 => "ARGB1555",
            Self::Argb4444 => "ARGB4444",
            Self::Palette => "Palette",
        }
    }

    /// Unpack the stored bytes of one pixel to B, G, R, A.
    ///
    /// Palette indices are resolved by the caller.
    pub(super) fn unpack(self, bytes: &[u8]) -> [u8; 4] {
        let word = || u16::from_le_bytes([bytes[0], bytes[1]]);
        match self {
            Self::Argb8888 => [bytes[0], bytes[1], bytes[2], bytes[3]],
            Self::Rgb888 => [bytes[0], bytes[1], bytes[2], 0xFF],
            Self::GrayAlpha88 => [bytes[0], bytes[0], bytes[0], bytes[1]],
            Self::Gray8 | Self::Palette => [bytes[0], bytes[0], bytes[0], 0xFF],
            Self::Rgb565 => {
                let v = word();
                [
                    rescale(v & 0x1F, 5),
                    rescale((v >> 5) & 0x3F, 6),
                    rescale(v >> 11, 5),
                    0xFF,
                ]
            }
            Self::Argb1555 => {
                let v = word();
                [
                    rescale(v & 0x1F, 5),
                    rescale((v >> 5) & 0x1F, 5),
                    rescale((v >> 10) & 0x1F, 5),
                    rescale(v >> 15, 1),
                ]
            }
            Self::Argb4444 => {
                let v = word();
                [
                    rescale(v & 0xF, 4),
                    rescale((v >> 4) & 0xF, 4),
                    rescale((v >> 8) & 0xF, 4),
                    rescale(v >> 12, 4),
                ]
            }
        }
    }

    /// Pack one B, G, R, A pixel into this format's stored bytes.
    ///
    /// Palette indices are assigned by the caller.
    pub(super) fn pack(self, px: [u8; 4], out: &mut Vec<u8>) {
        let [b, g, r, a] = px;
        match self {
            Self::Argb8888 => out.extend_from_slice(&px),
            Self::Rgb888 => out.extend_from_slice(&[b, g, r]),
            Self::GrayAlpha88 => out.extend_from_slice(&[gray(px), a]),
            Self::Gray8 | Self::Palette => out.push(gray(px)),
            Self::Rgb565 => {
                let v = (quantize(r, 5) << 11) | (quantize(g, 6) << 5) | quantize(b, 5);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Self::Argb1555 => {
                let v = (quantize(a, 1) << 15)
                    | (quantize(r, 5) << 10)
                    | (quantize(g, 5) << 5)
                    | quantize(b, 5);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Self::Argb4444 => {
                let v = (quantize(a, 4) << 12)
                    | (quantize(r, 4) << 8)
                    | (quantize(g, 4) << 4)
                    | quantize(b, 4);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
}

/// Linear rescale of a `bits`-wide channel to 8 bits, rounded half up
#[must_use]
pub fn rescale(raw: u16, bits: u32) -> u8 {
    let max = (1u32 << bits) - 1;
    ((u32::from(raw) * 510 + max) / (2 * max)) as u8
}

/// Inverse of [`rescale`]: nearest `bits`-wide value for an 8-bit channel
fn quantize(value: u8, bits: u32) -> u16 {
    let max = (1u32 << bits) - 1;
    ((u32::from(value) * max + 127) / 255) as u16
}

fn gray(px: [u8; 4]) -> u8 {
    let [b, g, r, _] = px.map(u32::from);
    ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_exact() {
        assert_eq!(rescale(0xF, 4), 255);
        assert_eq!(rescale(0x0, 4), 0);
        assert_eq!(rescale(0x7, 4), 119);
        assert_eq!(rescale(31, 5), 255);
        assert_eq!(rescale(63, 6), 255);
        assert_eq!(rescale(1, 1), 255);
        for raw in 0..32u16 {
            let expected = (f64::from(raw) * 255.0 / 31.0).round() as u8;
            assert_eq!(rescale(raw, 5), expected);
        }
    }

    #[test]
    fn test_quantize_inverts_rescale() {
        for bits in [1, 4, 5, 6] {
            for raw in 0..(1u16 << bits) {
                assert_eq!(quantize(rescale(raw, bits), bits), raw);
            }
        }
    }

    #[test]
    fn test_4444_unpack() {
        // a=0xF r=0x7 g=0x0 b=0xF
        let v: u16 = 0xF70F;
        assert_eq!(GfPixelFormat::Argb4444.unpack(&v.to_le_bytes()), [255, 0, 119, 255]);
    }

    #[test]
    fn test_16bit_pack_round_trip() {
        for format in [GfPixelFormat::Rgb565, GfPixelFormat::Argb1555, GfPixelFormat::Argb4444] {
            for v in [0u16, 0x1234, 0xFFFF, 0x8001] {
                let px = format.unpack(&v.to_le_bytes());
                let mut out = Vec::new();
                format.pack(px, &mut out);
                assert_eq!(u16::from_le_bytes([out[0], out[1]]), v, "{format:?} {v:#x}");
            }
        }
    }

    #[test]
    fn test_codes() {
        for code in [8888, 888, 88, 8, 565, 1555, 4444, 256] {
            assert_eq!(GfPixelFormat::from_code(code).unwrap().code(), code);
        }
        assert!(GfPixelFormat::from_code(1234).is_err());
    }
}
