//! Archive session: an open archive with per-member file types
//!
//! The session owns the backing reader, the parsed archive and the file-type
//! registry. Imports and removals are queued and only reach disk on
//! [`ArchiveSession::repack`], which writes a scratch file next to the archive
//! and moves it over the original once the save has fully succeeded.

mod cancel;
mod progress;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::archive::{Archive, EntryInfo, ImportList};
use crate::config::ArchiveSettings;
use crate::error::{Error, Result};
use crate::file_type::{ErrorFileType, FileType, FileTypeRegistry, ThumbnailData};
use crate::utils::{FileExtension, ReadSeek};

pub use cancel::CancellationToken;
pub use progress::{ProgressCallback, SessionProgress};

/// One archive member with its current file type
#[derive(Debug, Clone)]
pub struct ArchiveFileItem {
    pub entry: EntryInfo,
    pub file_type: Arc<dyn FileType>,
}

/// Members sharing one directory, root first in listings
#[derive(Debug, Clone)]
pub struct ArchiveFolder {
    pub path: String,
    pub items: Vec<ArchiveFileItem>,
}

/// Outcome of a thumbnail batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThumbnailSummary {
    pub loaded: usize,
    /// Members switched to the error type
    pub failed: usize,
    pub cancelled: bool,
}

/// An open archive and its pending changes
#[derive(Debug)]
pub struct ArchiveSession<R = BufReader<File>> {
    reader: R,
    archive: Archive,
    registry: FileTypeRegistry,
    types: HashMap<String, Arc<dyn FileType>>,
    imports: ImportList,
}

impl ArchiveSession<BufReader<File>> {
    /// Open the archive file at `path`
    pub fn open(path: impl AsRef<Path>, settings: &ArchiveSettings) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening {} archive {}", settings.format.as_str(), path.display());
        Self::from_reader(BufReader::new(File::open(path)?), settings)
    }

    /// Write the archive with all pending changes to `archive_path`.
    ///
    /// The new archive is saved to a temporary file in the same directory and
    /// then moved over `archive_path`, so the target is untouched when the save
    /// fails. The session then reads from the new file.
    pub fn repack(&mut self, archive_path: impl AsRef<Path>) -> Result<()> {
        let archive_path = archive_path.as_ref();
        let dir = archive_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Entries move to their new offsets during the save; the session keeps
        // the old ones until the new file is in place
        let mut saved = self.archive.clone();
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            saved.save(&mut self.reader, &mut writer, &self.imports)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(archive_path).map_err(|e| Error::Io(e.error))?;
        let reader = BufReader::new(File::open(archive_path)?);

        self.archive = saved;
        self.reader = reader;
        self.imports.clear();
        self.classify_all();
        info!("Repacked {} ({} files)", archive_path.display(), self.archive.len());
        Ok(())
    }
}

impl<R: Read + Seek> ArchiveSession<R> {
    /// Parse the archive header from `reader`
    pub fn from_reader(mut reader: R, settings: &ArchiveSettings) -> Result<Self> {
        let archive = Archive::load(&mut reader, settings)?;
        let mut session = Self {
            reader,
            archive,
            registry: FileTypeRegistry::new(settings.platform),
            types: HashMap::new(),
            imports: ImportList::new(),
        };
        session.classify_all();
        Ok(session)
    }

    /// Replace the file-type registry and reclassify every member
    #[must_use]
    pub fn with_registry(mut self, registry: FileTypeRegistry) -> Self {
        self.registry = registry;
        self.classify_all();
        self
    }

    fn classify_all(&mut self) {
        self.types = self
            .archive
            .entries()
            .into_iter()
            .map(|e| {
                let file_type = self.registry.classify(&e.path, None);
                (e.path, file_type)
            })
            .collect();
    }

    #[must_use]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    #[must_use]
    pub fn registry(&self) -> &FileTypeRegistry {
        &self.registry
    }

    /// Queued imports and removals
    #[must_use]
    pub fn imports(&self) -> &ImportList {
        &self.imports
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.imports.is_empty()
    }

    /// Current file type of the member at `path`
    #[must_use]
    pub fn file_type(&self, path: &str) -> Arc<dyn FileType> {
        self.types
            .get(path)
            .cloned()
            .unwrap_or_else(|| self.registry.classify(path, None))
    }

    /// Members grouped by directory, root first
    #[must_use]
    pub fn list(&self) -> Vec<ArchiveFolder> {
        self.archive
            .directories()
            .into_iter()
            .map(|dir| ArchiveFolder {
                path: dir.path,
                items: dir
                    .entries
                    .into_iter()
                    .map(|entry| ArchiveFileItem {
                        file_type: self.file_type(&entry.path),
                        entry,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Decoded bytes of a member, with queued replacements taking precedence
    pub fn read_member(&mut self, path: &str) -> Result<Vec<u8>> {
        if let Some(data) = self.imports.get(path) {
            return Ok(data.clone());
        }
        if self.imports.is_removed(path) {
            return Err(Error::FileNotFoundInArchive(path.to_string()));
        }
        self.archive.read_file(&mut self.reader, path)
    }

    fn substitute_error(&mut self, path: &str, error: &Error) -> Arc<dyn FileType> {
        warn!("{path}: {error}");
        let error_type: Arc<dyn FileType> = Arc::new(ErrorFileType::new(error.to_string()));
        self.types.insert(path.to_string(), Arc::clone(&error_type));
        error_type
    }

    /// Thumbnail every member in archive order.
    ///
    /// `on_item` receives each member with its thumbnail. A member whose
    /// content its type cannot read is switched to the error type and reported
    /// with the error's info; the batch continues. `token` is checked before
    /// each member.
    pub fn load_thumbnails<F>(&mut self, token: &CancellationToken, mut on_item: F) -> Result<ThumbnailSummary>
    where
        F: FnMut(&ArchiveFileItem, &ThumbnailData),
    {
        let mut summary = ThumbnailSummary::default();
        let fallback = self.registry.fallback();

        for entry in self.archive.entries() {
            if token.is_cancelled() {
                debug!("Thumbnail batch cancelled before {}", entry.path);
                summary.cancelled = true;
                break;
            }
            let path = entry.path.clone();
            let ext = FileExtension::from_path(&path).unwrap_or_else(|| FileExtension::new(""));

            let bytes = match self.read_member(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.is_codec_error() => {
                    let file_type = self.substitute_error(&path, &e);
                    let thumb = file_type.load_thumbnail(&mut Cursor::new(Vec::new()), &ext)?;
                    on_item(&ArchiveFileItem { entry, file_type }, &thumb);
                    summary.failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let mut content = Cursor::new(bytes);

            let mut file_type = self.file_type(&path);
            if Arc::ptr_eq(&file_type, &fallback) {
                let refined = self.registry.classify(&path, Some(&mut content));
                if !Arc::ptr_eq(&refined, &fallback) {
                    self.types.insert(path.clone(), Arc::clone(&refined));
                    file_type = refined;
                }
            }

            match file_type.load_thumbnail(&mut content, &ext) {
                Ok(thumb) => {
                    on_item(&ArchiveFileItem { entry, file_type }, &thumb);
                    summary.loaded += 1;
                }
                Err(e) => {
                    let file_type = self.substitute_error(&path, &e);
                    let thumb = file_type.load_thumbnail(&mut content, &ext)?;
                    on_item(&ArchiveFileItem { entry, file_type }, &thumb);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Export the member at `path` as `out_ext` into `writer`.
    ///
    /// Exporting to the member's own extension writes its bytes unchanged.
    pub fn export(&mut self, path: &str, out_ext: &FileExtension, writer: &mut dyn Write) -> Result<()> {
        let bytes = self.read_member(path)?;
        let in_ext = FileExtension::from_path(path);
        if in_ext.as_ref() == Some(out_ext) {
            writer.write_all(&bytes)?;
            return Ok(());
        }
        let in_ext = in_ext.ok_or_else(|| Error::unsupported(path, format!("export to {out_ext}")))?;
        self.file_type(path)
            .convert_to(&in_ext, out_ext, &mut Cursor::new(bytes), writer)
    }

    /// Decoded members written under `output_dir`, keeping archive paths.
    ///
    /// Members whose path would escape `output_dir` are skipped. Returns the
    /// number of files written.
    pub fn extract_all(&mut self, output_dir: impl AsRef<Path>, progress: ProgressCallback) -> Result<usize> {
        let output_dir = output_dir.as_ref();
        let entries = self.archive.entries();
        let total = entries.len();
        let mut written = 0;

        for (index, entry) in entries.iter().enumerate() {
            progress(&SessionProgress::new(index + 1, total, entry.path.as_str()));
            let Some(relative) = safe_relative_path(&entry.path) else {
                warn!("Skipping member with unsafe path: {}", entry.path);
                continue;
            };
            let target = output_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let data = self.read_member(&entry.path)?;
            std::fs::write(&target, data)?;
            written += 1;
        }

        Ok(written)
    }

    /// Queue `data`, a file in `in_ext` format, as the new content of `path`.
    ///
    /// The data is converted to the member's own format by its file type; a
    /// member that does not exist yet is added on repack.
    pub fn import_file(&mut self, path: &str, in_ext: &FileExtension, data: Vec<u8>) -> Result<()> {
        let target = FileExtension::from_path(path)
            .ok_or_else(|| Error::unsupported(path, "import into a member without extension"))?;
        let file_type = self.file_type(path);

        let stored = if in_ext == &target {
            data
        } else {
            let mut current = if self.archive.entry(path).is_some() && !self.imports.is_removed(path) {
                Some(Cursor::new(self.read_member(path)?))
            } else {
                None
            };
            let mut output = Vec::new();
            file_type.convert_from(
                in_ext,
                &target,
                current.as_mut().map(|c| c as &mut dyn ReadSeek),
                &mut Cursor::new(data),
                &mut output,
            )?;
            output
        };

        debug!("Queued {} bytes for {path} ({})", stored.len(), file_type.name());
        self.imports.insert(path, stored);
        self.types.insert(path.to_string(), file_type);
        Ok(())
    }

    /// Queue removal of the member at `path`
    pub fn remove_file(&mut self, path: &str) {
        self.imports.remove(path);
    }
}

/// Archive path as a relative filesystem path, or `None` if it would escape
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let normalized = path.replace('\\', "/");
    let relative = PathBuf::from(normalized.trim_start_matches('/'));
    let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
    (safe && relative.components().next().is_some()).then_some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::IpkArchive;
    use crate::archive::ArchiveContainer;
    use crate::config::Platform;
    use crate::image::{GfImageFormat, ImageFormat, PixelFormat, RawImageData};

    fn settings() -> ArchiveSettings {
        ArchiveSettings::ubiart(Platform::Pc)
    }

    fn gf(width: u32, height: u32) -> Vec<u8> {
        let image = RawImageData::new(width, height, PixelFormat::Bgr24, vec![0x33; (width * height * 3) as usize]).unwrap();
        let mut out = Vec::new();
        GfImageFormat::default().encode(&image, &mut out).unwrap();
        out
    }

    fn archive_bytes(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut archive = IpkArchive::new(&settings(), 5);
        let mut imports = ImportList::new();
        for (path, data) in files {
            imports.insert(*path, data.clone());
        }
        let mut output = Cursor::new(Vec::new());
        archive.save(&mut Cursor::new(Vec::new()), &mut output, &imports).unwrap();
        output.into_inner()
    }

    fn session(files: &[(&str, Vec<u8>)]) -> ArchiveSession<Cursor<Vec<u8>>> {
        ArchiveSession::from_reader(Cursor::new(archive_bytes(files)), &settings()).unwrap()
    }

    #[test]
    fn test_corrupt_member_becomes_error_type() {
        let mut session = session(&[
            ("tex/good.gf", gf(4, 4)),
            ("tex/bad.gf", b"definitely not a GF texture".to_vec()),
            ("notes.txt", b"hello".to_vec()),
        ]);

        let mut seen = Vec::new();
        let summary = session
            .load_thumbnails(&CancellationToken::new(), |item, thumb| {
                seen.push((item.entry.path.clone(), item.file_type.name(), thumb.thumbnail.is_some()));
            })
            .unwrap();

        assert_eq!(summary, ThumbnailSummary { loaded: 2, failed: 1, cancelled: false });
        assert!(seen.contains(&("tex/good.gf".to_string(), "Image", true)));
        assert!(seen.contains(&("tex/bad.gf".to_string(), "Error", false)));
        assert!(seen.contains(&("notes.txt".to_string(), "Default", false)));

        let listed: Vec<_> = session.list().into_iter().flat_map(|f| f.items).collect();
        assert_eq!(listed.len(), 3);
        let bad = listed.iter().find(|i| i.entry.path == "tex/bad.gf").unwrap();
        assert_eq!(bad.file_type.name(), "Error");
    }

    #[test]
    fn test_cancelled_batch_stops_between_items() {
        let mut session = session(&[("a.gf", gf(4, 4)), ("b.gf", gf(4, 4))]);
        let token = CancellationToken::new();
        let mut count = 0;
        let summary = session
            .load_thumbnails(&token, |_, _| {
                count += 1;
                token.cancel();
            })
            .unwrap();
        assert_eq!(count, 1);
        assert!(summary.cancelled);
    }

    #[test]
    fn test_content_sniff_refines_default() {
        let mut cooked = vec![0, 0, 0, 9];
        cooked.extend_from_slice(b"TEX\0");
        cooked.extend_from_slice(&[0; 36]);
        let mut session = session(&[("logo.ckd", cooked)]);
        assert_eq!(session.file_type("logo.ckd").name(), "Default");

        session.load_thumbnails(&CancellationToken::new(), |_, _| {}).unwrap();
        // Sniffed as a cooked texture, then rejected for its empty payload
        assert_eq!(session.file_type("logo.ckd").name(), "Error");
    }

    #[test]
    fn test_export_and_import() {
        let mut session = session(&[("tex/a.gf", gf(2, 2))]);

        let mut png = Vec::new();
        session.export("tex/a.gf", &FileExtension::new("png"), &mut png).unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        let mut raw = Vec::new();
        session.export("tex/a.gf", &FileExtension::new("gf"), &mut raw).unwrap();
        assert_eq!(raw, gf(2, 2));

        session.import_file("tex/a.gf", &FileExtension::new("png"), png).unwrap();
        assert!(session.has_pending_changes());
        assert_eq!(session.read_member("tex/a.gf").unwrap(), gf(2, 2));

        session.remove_file("tex/a.gf");
        assert!(matches!(
            session.read_member("tex/a.gf"),
            Err(Error::FileNotFoundInArchive(_))
        ));
    }

    #[test]
    fn test_failed_repack_leaves_session_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.ipk");
        std::fs::write(&path, archive_bytes(&[("a.txt", b"AAAA".to_vec()), ("b.txt", b"BBBBBBBB".to_vec())])).unwrap();

        let mut session = ArchiveSession::open(&path, &settings()).unwrap();
        let before = session.archive().entries();
        session.import_file("a.txt", &FileExtension::new("txt"), vec![b'x'; 5000]).unwrap();

        // A non-empty directory cannot be replaced by the new archive
        let blocker = dir.path().join("blocker");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"k").unwrap();
        assert!(session.repack(&blocker).is_err());

        assert_eq!(session.archive().entries(), before);
        assert!(session.has_pending_changes());
        assert_eq!(session.read_member("b.txt").unwrap(), b"BBBBBBBB");

        session.repack(&path).unwrap();
        assert!(!session.has_pending_changes());
        assert_eq!(session.read_member("a.txt").unwrap(), vec![b'x'; 5000]);
        assert_eq!(session.read_member("b.txt").unwrap(), b"BBBBBBBB");
    }

    #[test]
    fn test_extract_all_reports_each_member() {
        let mut session = session(&[("a.txt", b"a".to_vec()), ("dir/b.txt", b"b".to_vec())]);
        let dir = tempfile::tempdir().unwrap();
        let seen = std::cell::RefCell::new(Vec::new());
        let written = session
            .extract_all(dir.path(), &|p: &SessionProgress| seen.borrow_mut().push(p.clone()))
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            seen.into_inner(),
            vec![SessionProgress::new(1, 2, "a.txt"), SessionProgress::new(2, 2, "dir/b.txt")]
        );
        assert_eq!(std::fs::read(dir.path().join("dir/b.txt")).unwrap(), b"b");
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(safe_relative_path("a\\b.gf"), Some(PathBuf::from("a/b.gf")));
        assert_eq!(safe_relative_path("/root.txt"), Some(PathBuf::from("root.txt")));
        assert_eq!(safe_relative_path("../evil"), None);
        assert_eq!(safe_relative_path(""), None);
    }
}
