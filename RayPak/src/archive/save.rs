//! Shared repack algorithm
//!
//! The header is sized first so member data can be streamed straight to its
//! final position. Member bytes come from an [`ArchiveFileGenerator`], which
//! hands each entry its offset before producing it; the header is written last
//! once every entry carries its final offset and sizes.

use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom, Write};

use super::{ArchiveContainer, ArchiveEntry, ArchiveFileGenerator, ImportList};
use crate::error::{Error, Result};
use crate::utils::binary::read_exact_vec;

pub(super) fn save_archive<A, R, W>(
    archive: &mut A,
    input: &mut R,
    output: &mut W,
    imports: &ImportList,
) -> Result<()>
where
    A: ArchiveContainer,
    R: Read + Seek,
    W: Write + Seek,
{
    let container: &A = archive;

    let mut entries: Vec<A::Entry> = container
        .entries()
        .iter()
        .filter(|e| !imports.is_removed(e.path()))
        .cloned()
        .collect();
    for (path, _) in imports.files() {
        if !entries.iter().any(|e| e.path() == path) {
            entries.push(container.get_file_entry(path));
        }
    }

    let input = RefCell::new(input);
    let input = &input;
    let mut generator = ArchiveFileGenerator::new();

    for (index, entry) in entries.iter().enumerate() {
        if let Some(data) = imports.get(entry.path()) {
            generator.add(
                index,
                Box::new(move |entry: &mut A::Entry| container.encode_file(data, entry)),
            )?;
        } else {
            let source_offset = entry.offset();
            let stored_size = entry.stored_size() as usize;
            generator.add(
                index,
                Box::new(move |_: &mut A::Entry| {
                    let mut reader = input.borrow_mut();
                    reader.seek(SeekFrom::Start(source_offset))?;
                    read_exact_vec(&mut **reader, stored_size)
                }),
            )?;
        }
    }

    let base_offset = container.header_size(&entries)?;
    tracing::debug!(
        "Repacking {} entries, data starts at {base_offset:#x}",
        entries.len()
    );

    output.seek(SeekFrom::Start(0))?;
    output.write_all(&vec![0u8; base_offset as usize])?;

    let mut cursor = base_offset;
    for (index, entry) in entries.iter_mut().enumerate() {
        let data = generator.assign_offset(&index, cursor)?.produce(entry)?;
        if data.len() as u64 != entry.stored_size() {
            return Err(Error::InvariantViolation(format!(
                "{} produced {} bytes but records {}",
                entry.path(),
                data.len(),
                entry.stored_size()
            )));
        }
        output.write_all(&data)?;
        cursor += data.len() as u64;
    }

    if generator.remaining() != 0 {
        return Err(Error::InvariantViolation(format!(
            "{} entries were never written",
            generator.remaining()
        )));
    }
    drop(generator);

    let mut header = Vec::with_capacity(base_offset as usize);
    container.write_header(&entries, &mut header)?;
    if header.len() as u64 != base_offset {
        return Err(Error::InvariantViolation(format!(
            "header is {} bytes, {base_offset} were reserved",
            header.len()
        )));
    }
    output.seek(SeekFrom::Start(0))?;
    output.write_all(&header)?;
    output.seek(SeekFrom::Start(cursor))?;
    output.flush()?;

    archive.set_entries(entries)
}
