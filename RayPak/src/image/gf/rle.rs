//! Escape-byte run-length coding of GF byte planes
//!
//! A byte equal to the escape value starts a run: `escape, value, count`.
//! Any other byte is a literal.

use std::io::Read;

use byteorder::ReadBytesExt;

use crate::error::{Error, Result};
use crate::utils::binary::MAX_PREALLOC;

/// Shortest run worth an escape sequence
const MIN_RUN: usize = 4;

/// Decode one plane of exactly `len` bytes
pub(super) fn decode_plane<R: Read + ?Sized>(reader: &mut R, repeat_byte: u8, len: usize) -> Result<Vec<u8>> {
    let mut plane = Vec::with_capacity(len.min(MAX_PREALLOC));
    while plane.len() < len {
        let byte = reader.read_u8()?;
        if byte != repeat_byte {
            plane.push(byte);
            continue;
        }

        let value = reader.read_u8()?;
        let count = reader.read_u8()? as usize;
        if plane.len() + count > len {
            return Err(Error::decode(
                "GF",
                format!("run of {count} overflows plane of {len} bytes"),
            ));
        }
        plane.resize(plane.len() + count, value);
    }
    Ok(plane)
}

/// Encode one plane
pub(super) fn encode_plane(plane: &[u8], repeat_byte: u8, out: &mut Vec<u8>) {
    let mut i = 0;
    while i < plane.len() {
        let value = plane[i];
        let run = plane[i..].iter().take(255).take_while(|&&b| b == value).count();

        if run >= MIN_RUN || value == repeat_byte {
            out.extend_from_slice(&[repeat_byte, value, run as u8]);
        } else {
            out.extend(std::iter::repeat_n(value, run));
        }
        i += run;
    }
}

/// Least frequent byte across all planes, lowest value on ties
pub(super) fn pick_repeat_byte(planes: &[Vec<u8>]) -> u8 {
    let mut counts = [0usize; 256];
    for &b in planes.iter().flatten() {
        counts[b as usize] += 1;
    }
    (0..=255u8).min_by_key(|&b| counts[b as usize]).unwrap_or(0)
}
