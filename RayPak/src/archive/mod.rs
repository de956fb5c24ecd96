//! Archive container model
//!
//! Every supported dialect provides one container type and one entry type,
//! reached through [`ArchiveContainer`] and [`ArchiveEntry`]. [`Archive`] is the
//! closed set of dialects for callers that do not care which one they hold.

mod compression;
mod directory;
mod generator;
mod import;
mod save;

pub mod cnt;
pub mod ipk;

use std::io::{Read, Seek, SeekFrom, Write};

use serde::Serialize;

use crate::config::{ArchiveFormat, ArchiveSettings};
use crate::error::{Error, Result};
use crate::utils::binary::read_exact_vec;

pub use compression::CompressionMethod;
pub use directory::{ArchiveDirectory, DirectoryListing, group_by_directory};
pub use generator::{ArchiveFileGenerator, PendingFile, Producer};
pub use import::ImportList;

pub use cnt::{CntArchive, CntFileEntry};
pub use ipk::{IpkArchive, IpkFileEntry};

/// One member of an archive
pub trait ArchiveEntry {
    /// Member path, `/` or `\` separated depending on the dialect
    fn path(&self) -> &str;

    /// Absolute offset of the stored bytes in the archive stream
    fn offset(&self) -> u64;

    /// Record the absolute offset the member is written at
    fn set_offset(&mut self, offset: u64);

    /// Number of bytes stored in the archive (compressed size when compressed)
    fn stored_size(&self) -> u64;

    /// Size of the member once decoded
    fn size(&self) -> u64;

    fn is_compressed(&self) -> bool;

    /// Owned, dialect-agnostic summary
    fn info(&self) -> EntryInfo {
        EntryInfo {
            path: self.path().to_string(),
            offset: self.offset(),
            stored_size: self.stored_size(),
            size: self.size(),
            is_compressed: self.is_compressed(),
        }
    }
}

/// Dialect-agnostic description of an archive member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub path: String,
    pub offset: u64,
    pub stored_size: u64,
    pub size: u64,
    pub is_compressed: bool,
}

/// Load/save capability shared by every archive dialect
pub trait ArchiveContainer: Sized {
    type Entry: ArchiveEntry + Clone;

    /// Parse the header at stream offset 0
    fn load<R: Read + Seek>(reader: &mut R, settings: &ArchiveSettings) -> Result<Self>;

    fn settings(&self) -> &ArchiveSettings;

    fn entries(&self) -> &[Self::Entry];

    /// Replace the entry list after a save
    fn set_entries(&mut self, entries: Vec<Self::Entry>) -> Result<()>;

    /// Build a fresh entry for a member added at `path`
    fn get_file_entry(&self, path: &str) -> Self::Entry;

    /// Turn member bytes into their stored form, updating the entry's sizes
    fn encode_file(&self, data: &[u8], entry: &mut Self::Entry) -> Result<Vec<u8>>;

    /// Turn stored bytes back into member bytes
    fn decode_file(&self, data: Vec<u8>, entry: &Self::Entry) -> Result<Vec<u8>>;

    /// Serialized header size for `entries`
    fn header_size(&self, entries: &[Self::Entry]) -> Result<u64>;

    /// Serialize the header for `entries`
    fn write_header<W: Write>(&self, entries: &[Self::Entry], output: &mut W) -> Result<()>;

    fn find_entry(&self, path: &str) -> Option<&Self::Entry> {
        self.entries().iter().find(|e| e.path() == path)
    }

    /// Entries grouped by directory, root first
    fn directories(&self) -> Vec<ArchiveDirectory<'_, Self::Entry>> {
        group_by_directory(self.entries())
    }

    /// Read the stored bytes of a member without decoding
    fn read_stored<R: Read + Seek>(&self, reader: &mut R, entry: &Self::Entry) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(entry.offset()))?;
        read_exact_vec(reader, entry.stored_size() as usize)
    }

    /// Read and decode a member
    fn read_file<R: Read + Seek>(&self, reader: &mut R, entry: &Self::Entry) -> Result<Vec<u8>> {
        let stored = self.read_stored(reader, entry)?;
        self.decode_file(stored, entry)
    }

    /// Rebuild the archive into `output`.
    ///
    /// Members in `imports` are re-encoded, everything else is copied verbatim
    /// from `input`. Entries are updated in place with their new offsets and
    /// sizes. `output` should be a scratch stream: on error it is left partially
    /// written.
    fn save<R: Read + Seek, W: Write + Seek>(
        &mut self,
        input: &mut R,
        output: &mut W,
        imports: &ImportList,
    ) -> Result<()> {
        save::save_archive(self, input, output, imports)
    }
}

/// A loaded archive of any supported dialect
#[derive(Debug, Clone)]
pub enum Archive {
    Ipk(IpkArchive),
    Cnt(CntArchive),
}

macro_rules! dispatch {
    ($self:expr, $archive:ident => $body:expr) => {
        match $self {
            Archive::Ipk($archive) => $body,
            Archive::Cnt($archive) => $body,
        }
    };
}

impl Archive {
    /// Load an archive with the dialect chosen by `settings`
    pub fn load<R: Read + Seek>(reader: &mut R, settings: &ArchiveSettings) -> Result<Self> {
        match settings.format {
            ArchiveFormat::Ipk => Ok(Archive::Ipk(IpkArchive::load(reader, settings)?)),
            ArchiveFormat::Cnt => Ok(Archive::Cnt(CntArchive::load(reader, settings)?)),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ArchiveSettings {
        dispatch!(self, a => a.settings())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, a => a.entries().len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of every entry, in archive order
    #[must_use]
    pub fn entries(&self) -> Vec<EntryInfo> {
        dispatch!(self, a => a.entries().iter().map(ArchiveEntry::info).collect())
    }

    #[must_use]
    pub fn entry(&self, path: &str) -> Option<EntryInfo> {
        dispatch!(self, a => a.find_entry(path).map(ArchiveEntry::info))
    }

    /// Entries grouped by directory, root first
    #[must_use]
    pub fn directories(&self) -> Vec<DirectoryListing> {
        dispatch!(self, a => a.directories().iter().map(ArchiveDirectory::to_listing).collect())
    }

    /// Read and decode the member at `path`
    pub fn read_file<R: Read + Seek>(&self, reader: &mut R, path: &str) -> Result<Vec<u8>> {
        dispatch!(self, a => {
            let entry = a
                .find_entry(path)
                .ok_or_else(|| Error::FileNotFoundInArchive(path.to_string()))?;
            a.read_file(reader, entry)
        })
    }

    /// Rebuild the archive into `output`, see [`ArchiveContainer::save`]
    pub fn save<R: Read + Seek, W: Write + Seek>(
        &mut self,
        input: &mut R,
        output: &mut W,
        imports: &ImportList,
    ) -> Result<()> {
        dispatch!(self, a => a.save(input, output, imports))
    }
}
