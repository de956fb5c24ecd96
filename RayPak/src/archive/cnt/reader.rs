//! CNT header parsing

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::types::decode_name;
use super::{CntFileEntry, CntHeader, MAX_COUNT, MAX_NAME_LENGTH};
use crate::archive::ArchiveEntry;
use crate::error::{Error, Result};
use crate::utils::binary::read_exact_vec;
use crate::utils::stream_len;

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let count = reader.read_i32::<LittleEndian>()?;
    if !(0..=MAX_COUNT).contains(&count) {
        return Err(Error::malformed(format!("{what} count {count} out of range")));
    }
    Ok(count as usize)
}

fn read_flag<R: Read>(reader: &mut R, what: &str) -> Result<bool> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::malformed(format!("{what} flag must be 0 or 1, found {other}"))),
    }
}

fn read_name<R: Read>(reader: &mut R, header: &CntHeader) -> Result<String> {
    let len = reader.read_i32::<LittleEndian>()?;
    if !(0..=MAX_NAME_LENGTH).contains(&len) {
        return Err(Error::malformed(format!("name length {len} out of range")));
    }
    let mut bytes = read_exact_vec(reader, len as usize)?;
    if header.xor_used {
        for b in &mut bytes {
            *b ^= header.xor_key;
        }
    }
    Ok(decode_name(&bytes))
}

/// Parse the header, directory table and file table
pub(super) fn read_cnt<R: Read + Seek>(
    reader: &mut R,
) -> Result<(CntHeader, Vec<String>, Vec<CntFileEntry>)> {
    let stream_length = stream_len(reader)?;
    reader.seek(SeekFrom::Start(0))?;

    let dir_count = read_count(reader, "directory")?;
    let file_count = read_count(reader, "file")?;

    let mut header = CntHeader {
        xor_used: read_flag(reader, "xor")?,
        checksum_used: read_flag(reader, "checksum")?,
        xor_key: reader.read_u8()?,
        version_id: 0,
    };

    let mut directories = Vec::with_capacity(dir_count);
    for _ in 0..dir_count {
        directories.push(read_name(reader, &header)?);
    }

    header.version_id = reader.read_u8()?;

    let mut entries = Vec::with_capacity(file_count);
    for _ in 0..file_count {
        let dir_index = reader.read_i32::<LittleEndian>()?;
        let directory = match dir_index {
            -1 => String::new(),
            i if i >= 0 && (i as usize) < directories.len() => directories[i as usize].clone(),
            i => {
                return Err(Error::malformed(format!(
                    "directory index {i} outside table of {}",
                    directories.len()
                )));
            }
        };
        let name = read_name(reader, &header)?;

        let mut entry = CntFileEntry::new(directory, name);
        reader.read_exact(&mut entry.file_xor_key)?;
        entry.checksum = reader.read_u32::<LittleEndian>()?;

        let pointer = reader.read_i32::<LittleEndian>()?;
        let size = reader.read_i32::<LittleEndian>()?;
        if pointer < 0 || size < 0 {
            return Err(Error::malformed(format!(
                "{}: negative pointer {pointer} or size {size}",
                entry.path
            )));
        }
        entry.pointer = pointer as u64;
        entry.size = size as u32;

        let end = entry.offset() + entry.stored_size();
        if end > stream_length {
            return Err(Error::TruncatedStream {
                expected: end,
                actual: stream_length,
            });
        }
        entries.push(entry);
    }

    tracing::debug!(
        "Read CNT header: {} directories, {} files",
        directories.len(),
        entries.len()
    );

    Ok((header, directories, entries))
}
