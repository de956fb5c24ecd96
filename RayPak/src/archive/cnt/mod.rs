//! OpenSpace CNT container support
//!
//! Little-endian directory and file tables followed by member data at absolute
//! pointers. Names may be XOR'd with a single header key and member bytes with
//! a four-byte per-file key. Members are never compressed.

mod reader;
mod types;
mod writer;

pub use types::{CntFileEntry, CntHeader};

use std::io::{Read, Seek, Write};

use super::{ArchiveContainer, ArchiveEntry};
use crate::config::ArchiveSettings;
use crate::error::{Error, Result};

const MAX_COUNT: i32 = 1 << 20;
const MAX_NAME_LENGTH: i32 = 4096;

/// A loaded CNT container
#[derive(Debug, Clone)]
pub struct CntArchive {
    header: CntHeader,
    directories: Vec<String>,
    entries: Vec<CntFileEntry>,
    settings: ArchiveSettings,
}

impl CntArchive {
    /// Create an empty container, to be filled through [`ArchiveContainer::save`]
    #[must_use]
    pub fn new(settings: &ArchiveSettings, header: CntHeader) -> Self {
        Self {
            header,
            directories: Vec::new(),
            entries: Vec::new(),
            settings: settings.clone(),
        }
    }

    #[must_use]
    pub fn header(&self) -> &CntHeader {
        &self.header
    }

    /// Directory table in stored order
    #[must_use]
    pub fn directory_table(&self) -> &[String] {
        &self.directories
    }
}

impl ArchiveContainer for CntArchive {
    type Entry = CntFileEntry;

    fn load<R: Read + Seek>(reader: &mut R, settings: &ArchiveSettings) -> Result<Self> {
        let (header, directories, entries) = reader::read_cnt(reader)?;
        Ok(Self {
            header,
            directories,
            entries,
            settings: settings.clone(),
        })
    }

    fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }

    fn entries(&self) -> &[CntFileEntry] {
        &self.entries
    }

    fn set_entries(&mut self, entries: Vec<CntFileEntry>) -> Result<()> {
        self.directories = writer::directory_table(&self.directories, &entries)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.entries = entries;
        Ok(())
    }

    fn get_file_entry(&self, path: &str) -> CntFileEntry {
        let (directory, name) = match path.rfind(['/', '\\']) {
            Some(idx) => (path[..idx].replace('/', "\\"), &path[idx + 1..]),
            None => (String::new(), path),
        };
        let mut entry = CntFileEntry::new(directory, name.to_string());
        entry.path = path.to_string();
        entry
    }

    fn encode_file(&self, data: &[u8], entry: &mut CntFileEntry) -> Result<Vec<u8>> {
        entry.size = u32::try_from(data.len())
            .ok()
            .filter(|&size| i32::try_from(size).is_ok())
            .ok_or_else(|| {
                Error::InvariantViolation(format!("{}: {} bytes exceed i32", entry.path, data.len()))
            })?;
        let mut stored = data.to_vec();
        entry.apply_xor(&mut stored);
        Ok(stored)
    }

    fn decode_file(&self, mut data: Vec<u8>, entry: &CntFileEntry) -> Result<Vec<u8>> {
        entry.apply_xor(&mut data);
        Ok(data)
    }

    fn header_size(&self, entries: &[CntFileEntry]) -> Result<u64> {
        Ok(writer::header_size(&self.directories, entries))
    }

    fn write_header<W: Write>(&self, entries: &[CntFileEntry], output: &mut W) -> Result<()> {
        writer::write_cnt_header(output, &self.header, &self.directories, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ImportList;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn obfuscated() -> CntHeader {
        CntHeader {
            xor_used: true,
            checksum_used: false,
            xor_key: 0x5A,
            version_id: 3,
        }
    }

    fn build(header: CntHeader, files: &[(&str, &str)]) -> (CntArchive, Vec<u8>) {
        let mut archive = CntArchive::new(&ArchiveSettings::openspace(), header);
        let mut imports = ImportList::new();
        for (path, data) in files {
            imports.insert(*path, data.as_bytes().to_vec());
        }
        let mut output = Cursor::new(Vec::new());
        archive
            .save(&mut Cursor::new(Vec::new()), &mut output, &imports)
            .unwrap();
        (archive, output.into_inner())
    }

    #[test]
    fn test_build_and_load() {
        let (built, bytes) = build(
            obfuscated(),
            &[
                ("Textures\\wall.gf", "wall pixels"),
                ("logo.gf", "logo"),
                ("Textures/floor.gf", "floor"),
            ],
        );
        assert_eq!(built.directory_table(), ["Textures".to_string()]);

        let mut cursor = Cursor::new(bytes);
        let loaded = CntArchive::load(&mut cursor, &ArchiveSettings::openspace()).unwrap();
        assert_eq!(*loaded.header(), obfuscated());
        assert_eq!(loaded.directory_table(), built.directory_table());

        let paths: Vec<_> = loaded.entries().iter().map(ArchiveEntry::path).collect();
        assert_eq!(paths, ["Textures\\wall.gf", "logo.gf", "Textures\\floor.gf"]);

        let floor = loaded.find_entry("Textures\\floor.gf").unwrap();
        assert_eq!(loaded.read_file(&mut cursor, floor).unwrap(), b"floor");
        assert!(!floor.is_compressed());
    }

    #[test]
    fn test_file_key_round_trip() {
        let (mut archive, bytes) = build(CntHeader::default(), &[("a.gf", "plain")]);
        let mut input = Cursor::new(bytes);

        // Give the member a data key and rewrite it
        let mut entries = archive.entries().to_vec();
        entries[0].file_xor_key = [1, 2, 3, 4];
        archive.set_entries(entries).unwrap();

        let mut imports = ImportList::new();
        imports.insert("a.gf", b"secret".to_vec());
        let mut output = Cursor::new(Vec::new());
        archive.save(&mut input, &mut output, &imports).unwrap();

        let raw = output.get_ref().clone();
        let entry = &archive.entries()[0];
        let start = entry.offset() as usize;
        assert_eq!(raw[start], b's' ^ 1);

        let loaded = CntArchive::load(&mut output, &ArchiveSettings::openspace()).unwrap();
        assert_eq!(loaded.entries()[0].file_xor_key, [1, 2, 3, 4]);
        assert_eq!(loaded.read_file(&mut output, &loaded.entries()[0]).unwrap(), b"secret");
    }

    #[test]
    fn test_bad_flags_and_counts() {
        let (_, bytes) = build(CntHeader::default(), &[("a.gf", "x")]);

        let mut bad_flag = bytes.clone();
        bad_flag[8] = 2;
        let err = CntArchive::load(&mut Cursor::new(bad_flag), &ArchiveSettings::openspace()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));

        let mut bad_count = bytes.clone();
        bad_count[4..8].copy_from_slice(&(-1i32).to_le_bytes());
        let err = CntArchive::load(&mut Cursor::new(bad_count), &ArchiveSettings::openspace()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));

        let mut truncated = bytes;
        truncated.pop();
        let err = CntArchive::load(&mut Cursor::new(truncated), &ArchiveSettings::openspace()).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { .. }));
    }

    #[test]
    fn test_removed_directory_survives_in_table() {
        let (mut archive, bytes) = build(
            CntHeader::default(),
            &[("Sounds\\a.wav", "a"), ("b.gf", "b")],
        );
        let mut imports = ImportList::new();
        imports.remove("Sounds\\a.wav");
        let mut output = Cursor::new(Vec::new());
        archive.save(&mut Cursor::new(bytes), &mut output, &imports).unwrap();

        assert_eq!(archive.entries().len(), 1);
        assert_eq!(archive.directory_table(), ["Sounds".to_string()]);
    }
}
