//! Virtual directory tree derived from entry paths

use indexmap::IndexMap;
use serde::Serialize;

use super::{ArchiveEntry, EntryInfo};
use crate::utils::split_path;

/// Entries sharing one parent directory
#[derive(Debug)]
pub struct ArchiveDirectory<'a, E> {
    /// `/`-separated directory path, empty for the root
    pub path: String,
    pub entries: Vec<&'a E>,
}

impl<E: ArchiveEntry> ArchiveDirectory<'_, E> {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    #[must_use]
    pub fn to_listing(&self) -> DirectoryListing {
        DirectoryListing {
            path: self.path.clone(),
            entries: self.entries.iter().map(|e| e.info()).collect(),
        }
    }
}

/// Owned form of [`ArchiveDirectory`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    pub entries: Vec<EntryInfo>,
}

/// Group entries by the directory component of their path.
///
/// Directories come out in order of first occurrence. The root directory is
/// always present and always first, even when no entry lives in it.
pub fn group_by_directory<E: ArchiveEntry>(entries: &[E]) -> Vec<ArchiveDirectory<'_, E>> {
    let mut groups: IndexMap<String, Vec<&E>> = IndexMap::new();
    groups.insert(String::new(), Vec::new());

    for entry in entries {
        let (dir, _) = split_path(entry.path());
        groups.entry(dir).or_default().push(entry);
    }

    groups
        .into_iter()
        .map(|(path, entries)| ArchiveDirectory { path, entries })
        .collect()
}
