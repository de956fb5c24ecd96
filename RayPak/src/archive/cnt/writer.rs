//! CNT header serialization

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexSet;

use super::types::encode_name;
use super::{CntFileEntry, CntHeader};
use crate::error::{Error, Result};

/// Existing directories in table order, then directories of new members
pub(super) fn directory_table<'a>(
    directories: &'a [String],
    entries: &'a [CntFileEntry],
) -> IndexSet<&'a str> {
    let mut table: IndexSet<&str> = directories.iter().map(String::as_str).collect();
    for entry in entries {
        if !entry.directory.is_empty() {
            table.insert(&entry.directory);
        }
    }
    table
}

/// Serialized length of a single-byte name
fn name_len(name: &str) -> u64 {
    name.chars().count() as u64
}

pub(super) fn header_size(directories: &[String], entries: &[CntFileEntry]) -> u64 {
    let table = directory_table(directories, entries);
    let mut size: u64 = 4 + 4 + 1 + 1 + 1;
    size += table.iter().map(|d| 4 + name_len(d)).sum::<u64>();
    size += 1;
    for entry in entries {
        // dir_index, name_len, name, file key, checksum, pointer, size
        size += 4 + 4 + name_len(&entry.name) + 4 + 4 + 4 + 4;
    }
    size
}

fn write_name<W: Write>(writer: &mut W, header: &CntHeader, name: &str) -> Result<()> {
    let mut bytes = encode_name(name)
        .ok_or_else(|| Error::InvariantViolation(format!("{name} is not a single-byte name")))?;
    if header.xor_used {
        for b in &mut bytes {
            *b ^= header.xor_key;
        }
    }
    writer.write_i32::<LittleEndian>(to_i32(bytes.len() as u64, name)?)?;
    writer.write_all(&bytes)?;
    Ok(())
}

fn to_i32(value: u64, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::InvariantViolation(format!("{what}: {value} does not fit in i32")))
}

pub(super) fn write_cnt_header<W: Write>(
    writer: &mut W,
    header: &CntHeader,
    directories: &[String],
    entries: &[CntFileEntry],
) -> Result<()> {
    let table = directory_table(directories, entries);

    writer.write_i32::<LittleEndian>(to_i32(table.len() as u64, "directory count")?)?;
    writer.write_i32::<LittleEndian>(to_i32(entries.len() as u64, "file count")?)?;
    writer.write_u8(u8::from(header.xor_used))?;
    writer.write_u8(u8::from(header.checksum_used))?;
    writer.write_u8(header.xor_key)?;

    for dir in &table {
        write_name(writer, header, dir)?;
    }

    writer.write_u8(header.version_id)?;

    for entry in entries {
        let dir_index = if entry.directory.is_empty() {
            -1
        } else {
            let index = table.get_index_of(entry.directory.as_str()).ok_or_else(|| {
                Error::InvariantViolation(format!("{}: directory missing from table", entry.path))
            })?;
            to_i32(index as u64, &entry.path)?
        };

        writer.write_i32::<LittleEndian>(dir_index)?;
        write_name(writer, header, &entry.name)?;
        writer.write_all(&entry.file_xor_key)?;
        writer.write_u32::<LittleEndian>(entry.checksum)?;
        writer.write_i32::<LittleEndian>(to_i32(entry.pointer, &entry.path)?)?;
        writer.write_i32::<LittleEndian>(to_i32(u64::from(entry.size), &entry.path)?)?;
    }

    Ok(())
}
