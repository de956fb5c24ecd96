//! Types for OpenSpace CNT containers

use crate::archive::ArchiveEntry;

/// Header flags of a CNT container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CntHeader {
    /// Whether directory and file names are XOR'd with `xor_key`
    pub xor_used: bool,
    pub checksum_used: bool,
    pub xor_key: u8,
    pub version_id: u8,
}

/// One member of a CNT container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CntFileEntry {
    pub(crate) path: String,
    /// Directory as stored in the directory table, empty for root members
    pub(crate) directory: String,
    pub(crate) name: String,
    /// Per-file data key, applied cyclically; all zero means plain data
    pub file_xor_key: [u8; 4],
    pub checksum: u32,
    pub(crate) pointer: u64,
    pub size: u32,
}

impl CntFileEntry {
    pub(crate) fn new(directory: String, name: String) -> Self {
        let path = if directory.is_empty() {
            name.clone()
        } else {
            format!("{directory}\\{name}")
        };
        Self {
            path,
            directory,
            name,
            file_xor_key: [0; 4],
            checksum: 0,
            pointer: 0,
            size: 0,
        }
    }

    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// XOR member bytes with the file key. The operation is its own inverse.
    pub(crate) fn apply_xor(&self, data: &mut [u8]) {
        if self.file_xor_key == [0; 4] {
            return;
        }
        for (i, byte) in data.iter_mut().enumerate() {
            *byte ^= self.file_xor_key[i % 4];
        }
    }
}

impl ArchiveEntry for CntFileEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn offset(&self) -> u64 {
        self.pointer
    }

    fn set_offset(&mut self, offset: u64) {
        self.pointer = offset;
    }

    fn stored_size(&self) -> u64 {
        u64::from(self.size)
    }

    fn size(&self) -> u64 {
        u64::from(self.size)
    }

    fn is_compressed(&self) -> bool {
        false
    }
}

/// Names are single-byte strings; map bytes to chars one to one
pub(crate) fn decode_name(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode_name`]; `None` if a char does not fit in a byte
pub(crate) fn encode_name(name: &str) -> Option<Vec<u8>> {
    name.chars().map(|c| u8::try_from(c).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_is_involution() {
        let mut entry = CntFileEntry::new("Textures".to_string(), "wall.gf".to_string());
        assert_eq!(entry.path(), "Textures\\wall.gf");

        entry.file_xor_key = [0x11, 0x22, 0x33, 0x44];
        let original = b"abcdefgh".to_vec();
        let mut data = original.clone();
        entry.apply_xor(&mut data);
        assert_ne!(data, original);
        assert_eq!(data[0], b'a' ^ 0x11);
        assert_eq!(data[4], b'e' ^ 0x11);
        entry.apply_xor(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_names_are_single_byte() {
        let name = decode_name(&[b'f', 0xE9, b'e']);
        assert_eq!(encode_name(&name), Some(vec![b'f', 0xE9, b'e']));
        assert_eq!(encode_name("\u{4e16}"), None);
    }
}
