//! IPK header serialization

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::{IpkFileEntry, IpkHeader, MAGIC};
use crate::archive::ArchiveEntry;
use crate::error::{Error, Result};
use crate::utils::binary::write_prefixed_string;

/// Serialized header size. Entries are always written with a single offset.
pub(super) fn header_size(header: &IpkHeader, entries: &[IpkFileEntry]) -> u64 {
    let mut size: u64 = 9 * 4;
    if header.has_extra() {
        size += 4;
    }

    let flags_size = if header.has_entry_flags() { 4 } else { 0 };
    for entry in entries {
        // offset_count, size, compressed_size, timestamp, one offset
        size += 4 + 4 + 4 + 8 + 8;
        size += 4 + entry.dir.len() as u64;
        size += 4 + entry.name.len() as u64;
        size += 4 + flags_size;
    }
    size
}

/// Write the header with `base_offset` and entry offsets rebased onto it
pub(super) fn write_ipk_header<W: Write>(
    writer: &mut W,
    header: &IpkHeader,
    entries: &[IpkFileEntry],
) -> Result<()> {
    let base_offset = header_size(header, entries);
    let base = u32::try_from(base_offset)
        .map_err(|_| Error::InvariantViolation(format!("header size {base_offset} exceeds u32")))?;
    let files_count = u32::try_from(entries.len())
        .map_err(|_| Error::InvariantViolation(format!("{} entries exceed u32", entries.len())))?;

    writer.write_u32::<BigEndian>(MAGIC)?;
    writer.write_u32::<BigEndian>(header.version)?;
    writer.write_u32::<BigEndian>(header.platform)?;
    writer.write_u32::<BigEndian>(base)?;
    writer.write_u32::<BigEndian>(files_count)?;
    writer.write_u32::<BigEndian>(header.flags)?;
    writer.write_u32::<BigEndian>(header.data_crc)?;
    writer.write_u32::<BigEndian>(header.engine_signature)?;
    writer.write_u32::<BigEndian>(header.engine_version)?;
    if header.has_extra() {
        writer.write_u32::<BigEndian>(header.extra)?;
    }

    for entry in entries {
        if entry.is_compressed() && entry.compressed_size > entry.size {
            return Err(Error::InvariantViolation(format!(
                "{}: compressed size {} exceeds size {}",
                entry.path, entry.compressed_size, entry.size
            )));
        }
        let relative = entry.offset().checked_sub(base_offset).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "{}: offset {:#x} lies inside the header",
                entry.path,
                entry.offset()
            ))
        })?;

        writer.write_u32::<BigEndian>(1)?;
        writer.write_u32::<BigEndian>(entry.size)?;
        writer.write_u32::<BigEndian>(entry.compressed_size)?;
        writer.write_u64::<BigEndian>(entry.timestamp)?;
        writer.write_u64::<BigEndian>(relative)?;
        write_prefixed_string::<BigEndian, _>(writer, &entry.dir)?;
        write_prefixed_string::<BigEndian, _>(writer, &entry.name)?;
        writer.write_u32::<BigEndian>(entry.checksum)?;
        if header.has_entry_flags() {
            writer.write_u32::<BigEndian>(entry.flags)?;
        }
    }

    Ok(())
}
