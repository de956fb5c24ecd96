//! IPK header parsing

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use super::{IpkFileEntry, IpkHeader, MAGIC, MAX_FILES, MAX_OFFSETS, MAX_PATH_LENGTH, MAX_VERSION, MIN_VERSION};
use crate::archive::ArchiveEntry;
use crate::error::{Error, Result};
use crate::utils::binary::read_prefixed_string;
use crate::utils::stream_len;

/// Parse the header and entry table, validating every entry against the stream length
pub(super) fn read_ipk<R: Read + Seek>(reader: &mut R) -> Result<(IpkHeader, Vec<IpkFileEntry>)> {
    let stream_length = stream_len(reader)?;
    reader.seek(SeekFrom::Start(0))?;

    let magic = reader.read_u32::<BigEndian>()?;
    if magic != MAGIC {
        return Err(Error::malformed(format!(
            "bad IPK magic {magic:#010x}, expected {MAGIC:#010x}"
        )));
    }

    let version = reader.read_u32::<BigEndian>()?;
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(Error::malformed(format!(
            "unsupported IPK version {version} (supported: {MIN_VERSION}-{MAX_VERSION})"
        )));
    }

    let platform = reader.read_u32::<BigEndian>()?;
    let base_offset = reader.read_u32::<BigEndian>()?;
    let files_count = reader.read_u32::<BigEndian>()?;
    if files_count > MAX_FILES {
        return Err(Error::malformed(format!("implausible file count {files_count}")));
    }

    let mut header = IpkHeader {
        version,
        platform,
        base_offset,
        flags: reader.read_u32::<BigEndian>()?,
        data_crc: reader.read_u32::<BigEndian>()?,
        engine_signature: reader.read_u32::<BigEndian>()?,
        engine_version: reader.read_u32::<BigEndian>()?,
        extra: 0,
    };
    if header.has_extra() {
        header.extra = reader.read_u32::<BigEndian>()?;
    }

    if stream_length < u64::from(base_offset) {
        return Err(Error::TruncatedStream {
            expected: u64::from(base_offset),
            actual: stream_length,
        });
    }

    let mut entries = Vec::with_capacity(files_count as usize);
    for _ in 0..files_count {
        let entry = read_entry(reader, &header)?;

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
        "Read IPK v{version} header: {} entries, base offset {base_offset:#x}",
        entries.len()
    );

    Ok((header, entries))
}

fn read_entry<R: Read>(reader: &mut R, header: &IpkHeader) -> Result<IpkFileEntry> {
    let offset_count = reader.read_u32::<BigEndian>()?;
    if !(1..=MAX_OFFSETS).contains(&offset_count) {
        return Err(Error::malformed(format!(
            "entry offset count {offset_count} outside 1-{MAX_OFFSETS}"
        )));
    }

    let size = reader.read_u32::<BigEndian>()?;
    let compressed_size = reader.read_u32::<BigEndian>()?;
    let timestamp = reader.read_u64::<BigEndian>()?;

    let base = u64::from(header.base_offset);
    let mut offsets = Vec::with_capacity(offset_count as usize);
    for _ in 0..offset_count {
        let relative = reader.read_u64::<BigEndian>()?;
        let absolute = base.checked_add(relative).ok_or_else(|| {
            Error::malformed(format!("entry offset {relative:#x} overflows"))
        })?;
        offsets.push(absolute);
    }

    let dir = read_prefixed_string::<BigEndian, _>(reader, MAX_PATH_LENGTH)?;
    let name = read_prefixed_string::<BigEndian, _>(reader, MAX_PATH_LENGTH)?;
    let checksum = reader.read_u32::<BigEndian>()?;
    let flags = if header.has_entry_flags() {
        reader.read_u32::<BigEndian>()?
    } else {
        0
    };

    let mut entry = IpkFileEntry::new(dir, name);
    entry.offsets = offsets;
    entry.size = size;
    entry.compressed_size = compressed_size;
    entry.timestamp = timestamp;
    entry.checksum = checksum;
    entry.flags = flags;
    entry.compress_on_write = compressed_size != 0;

    Ok(entry)
}
