//! Types for UbiArt IPK bundles

use crate::archive::ArchiveEntry;

/// Fixed header fields of an IPK bundle.
///
/// Everything except `version` and `base_offset` is opaque to this crate and
/// written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpkHeader {
    pub version: u32,
    pub platform: u32,
    /// Offset that entry offsets are relative to; equals the header size
    pub base_offset: u32,
    pub flags: u32,
    pub data_crc: u32,
    pub engine_signature: u32,
    pub engine_version: u32,
    /// Present from version 8 on
    pub extra: u32,
}

impl IpkHeader {
    /// Whether entries carry a trailing flags field
    #[must_use]
    pub fn has_entry_flags(&self) -> bool {
        self.version >= 5
    }

    #[must_use]
    pub fn has_extra(&self) -> bool {
        self.version >= 8
    }
}

/// One member of an IPK bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpkFileEntry {
    pub(crate) path: String,
    pub(crate) dir: String,
    pub(crate) name: String,
    /// Absolute offsets; the first is authoritative, the rest are alternate copies
    pub(crate) offsets: Vec<u64>,
    pub size: u32,
    /// Zero when the member is stored uncompressed
    pub compressed_size: u32,
    pub timestamp: u64,
    pub checksum: u32,
    pub flags: u32,
    pub(crate) compress_on_write: bool,
}

impl IpkFileEntry {
    pub(crate) fn new(dir: String, name: String) -> Self {
        let path = join_path(&dir, &name);
        Self {
            path,
            dir,
            name,
            offsets: vec![0],
            size: 0,
            compressed_size: 0,
            timestamp: 0,
            checksum: 0,
            flags: 0,
            compress_on_write: false,
        }
    }

    /// Directory component as stored in the header
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All recorded offsets, including alternate copies
    #[must_use]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }
}

impl ArchiveEntry for IpkFileEntry {
    fn path(&self) -> &str {
        &self.path
    }

    fn offset(&self) -> u64 {
        self.offsets.first().copied().unwrap_or_default()
    }

    fn set_offset(&mut self, offset: u64) {
        self.offsets = vec![offset];
    }

    fn stored_size(&self) -> u64 {
        if self.is_compressed() {
            u64::from(self.compressed_size)
        } else {
            u64::from(self.size)
        }
    }

    fn size(&self) -> u64 {
        u64::from(self.size)
    }

    fn is_compressed(&self) -> bool {
        self.compressed_size != 0
    }
}

/// Join a stored directory and file name into a member path
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') || dir.ends_with('\\') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a.png"), "a.png");
        assert_eq!(join_path("world/", "a.png"), "world/a.png");
        assert_eq!(join_path("world", "a.png"), "world/a.png");
    }

    #[test]
    fn test_stored_size_follows_compression() {
        let mut entry = IpkFileEntry::new("dir/".to_string(), "a.ckd".to_string());
        entry.size = 100;
        assert_eq!(entry.stored_size(), 100);
        assert!(!entry.is_compressed());

        entry.compressed_size = 40;
        assert_eq!(entry.stored_size(), 40);
        assert!(entry.is_compressed());

        entry.offsets = vec![10, 20];
        assert_eq!(entry.offset(), 10);
        entry.set_offset(64);
        assert_eq!(entry.offsets(), &[64]);
    }
}
