//! Path utilities

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Normalize path separators to forward slashes (for archive paths)
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Get relative path and normalize separators
pub fn relative_path<P: AsRef<Path>>(path: P, base: P) -> Option<String> {
    path.as_ref()
        .strip_prefix(base.as_ref())
        .ok()
        .map(normalize_path)
}

/// Every file below `dir`, keyed by its `/`-separated path relative to `dir`,
/// sorted by that path
pub fn collect_files<P: AsRef<Path>>(dir: P) -> Result<Vec<(String, PathBuf)>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(relative) = relative_path(entry.path(), dir) {
            files.push((relative, entry.into_path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Split an archive path into its directory and file name.
///
/// Accepts both `/` and `\` separators; the directory is returned with `/`
/// separators and is empty for root-level members.
pub fn split_path(path: &str) -> (String, &str) {
    match path.rfind(['/', '\\']) {
        Some(idx) => (path[..idx].replace('\\', "/"), &path[idx + 1..]),
        None => (String::new(), path),
    }
}

/// Lower-cased, possibly multi-part file extension (`tga.ckd`, `png`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileExtension {
    full: String,
}

impl FileExtension {
    /// Build from an extension string, with or without a leading dot
    #[must_use]
    pub fn new(ext: &str) -> Self {
        Self {
            full: ext.trim_start_matches('.').to_lowercase(),
        }
    }

    /// Extension of the file name at the end of `path`.
    ///
    /// Everything after the first dot of the file name counts, so
    /// `Textures/logo.tga.ckd` yields `tga.ckd`. Returns `None` when the
    /// file name has no dot.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, name) = split_path(path);
        let idx = name.find('.')?;
        let ext = &name[idx + 1..];
        if ext.is_empty() {
            return None;
        }
        Some(Self::new(ext))
    }

    /// The whole extension, e.g. `tga.ckd`
    #[must_use]
    pub fn full(&self) -> &str {
        &self.full
    }

    /// The last component, e.g. `ckd`
    #[must_use]
    pub fn primary(&self) -> &str {
        self.full.rsplit('.').next().unwrap_or(&self.full)
    }

    /// Whether this extension equals `ext` as a whole or in its last component
    #[must_use]
    pub fn matches(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.full.eq_ignore_ascii_case(ext) || self.primary().eq_ignore_ascii_case(ext)
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{}", self.full)
    }
}
