//! Pending changes applied by a repack

use std::collections::HashSet;

use indexmap::IndexMap;

/// Members to replace, add or remove when an archive is saved
#[derive(Debug, Clone, Default)]
pub struct ImportList {
    files: IndexMap<String, Vec<u8>>,
    removed: HashSet<String>,
}

impl ImportList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the member at `path`, or add it if the archive lacks one
    pub fn insert(&mut self, path: impl Into<String>, data: Vec<u8>) {
        let path = path.into();
        self.removed.remove(&path);
        self.files.insert(path, data);
    }

    /// Drop the member at `path` from the saved archive
    pub fn remove(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.files.shift_remove(&path);
        self.removed.insert(path);
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(path)
    }

    #[must_use]
    pub fn is_removed(&self, path: &str) -> bool {
        self.removed.contains(path)
    }

    /// Imported members in insertion order
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.removed.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.removed.clear();
    }
}
