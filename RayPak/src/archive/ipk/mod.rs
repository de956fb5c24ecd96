//! UbiArt IPK bundle support
//!
//! Big-endian header followed by member data. Entry offsets are stored
//! relative to `base_offset`, which is the size of the serialized header.
//! Members on the compression allow-list are stored as zlib streams.

mod reader;
mod types;
mod writer;

pub use types::{IpkFileEntry, IpkHeader};

use std::io::{Read, Seek, Write};

use super::{ArchiveContainer, ArchiveEntry, CompressionMethod};
use crate::config::ArchiveSettings;
use crate::error::{Error, Result};
use crate::utils::{path_checksum, split_path};

/// IPK magic number
pub const MAGIC: u32 = 0x50EC12BA;

/// Oldest supported bundle version
pub const MIN_VERSION: u32 = 3;

/// Newest supported bundle version
pub const MAX_VERSION: u32 = 11;

/// Upper bound on alternate copies per entry
pub const MAX_OFFSETS: u32 = 16;

const MAX_FILES: u32 = 1 << 20;
const MAX_PATH_LENGTH: usize = 4096;

/// A loaded IPK bundle
#[derive(Debug, Clone)]
pub struct IpkArchive {
    header: IpkHeader,
    entries: Vec<IpkFileEntry>,
    settings: ArchiveSettings,
    compression: CompressionMethod,
}

impl IpkArchive {
    /// Create an empty bundle, to be filled through [`ArchiveContainer::save`]
    #[must_use]
    pub fn new(settings: &ArchiveSettings, version: u32) -> Self {
        let mut archive = Self {
            header: IpkHeader {
                version,
                platform: 0,
                base_offset: 0,
                flags: 0,
                data_crc: 0,
                engine_signature: 0,
                engine_version: 0,
                extra: 0,
            },
            entries: Vec::new(),
            settings: settings.clone(),
            compression: CompressionMethod::for_settings(settings),
        };
        archive.header.base_offset = writer::header_size(&archive.header, &[]) as u32;
        archive
    }

    #[must_use]
    pub fn header(&self) -> &IpkHeader {
        &self.header
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.header.version
    }
}

impl ArchiveContainer for IpkArchive {
    type Entry = IpkFileEntry;

    fn load<R: Read + Seek>(reader: &mut R, settings: &ArchiveSettings) -> Result<Self> {
        let (header, entries) = reader::read_ipk(reader)?;
        Ok(Self {
            header,
            entries,
            settings: settings.clone(),
            compression: CompressionMethod::for_settings(settings),
        })
    }

    fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }

    fn entries(&self) -> &[IpkFileEntry] {
        &self.entries
    }

    fn set_entries(&mut self, entries: Vec<IpkFileEntry>) -> Result<()> {
        let base_offset = writer::header_size(&self.header, &entries);
        self.header.base_offset = u32::try_from(base_offset)
            .map_err(|_| Error::InvariantViolation(format!("header size {base_offset} exceeds u32")))?;
        self.entries = entries;
        Ok(())
    }

    fn get_file_entry(&self, path: &str) -> IpkFileEntry {
        let (dir, name) = split_path(path);
        let dir = if dir.is_empty() { dir } else { format!("{dir}/") };

        let mut entry = IpkFileEntry::new(dir, name.to_string());
        entry.path = path.to_string();
        entry.checksum = path_checksum(path);
        entry.compress_on_write = self.settings.should_compress(path);
        entry
    }

    fn encode_file(&self, data: &[u8], entry: &mut IpkFileEntry) -> Result<Vec<u8>> {
        entry.size = u32::try_from(data.len()).map_err(|_| {
            Error::InvariantViolation(format!("{}: {} bytes exceed u32", entry.path, data.len()))
        })?;

        if !entry.compress_on_write || self.compression == CompressionMethod::None {
            entry.compressed_size = 0;
            return Ok(data.to_vec());
        }

        let compressed = self.compression.compress(data, &entry.path)?;
        if compressed.len() >= data.len() {
            tracing::info!(
                "{} does not shrink under {}, storing uncompressed",
                entry.path,
                self.compression.as_str()
            );
            entry.compressed_size = 0;
            return Ok(data.to_vec());
        }

        entry.compressed_size = compressed.len() as u32;
        Ok(compressed)
    }

    fn decode_file(&self, data: Vec<u8>, entry: &IpkFileEntry) -> Result<Vec<u8>> {
        if !entry.is_compressed() {
            return Ok(data);
        }
        let method = match self.compression {
            CompressionMethod::None => CompressionMethod::Zlib,
            method => method,
        };
        method.decompress(&data, entry.size as usize, &entry.path)
    }

    fn header_size(&self, entries: &[IpkFileEntry]) -> Result<u64> {
        Ok(writer::header_size(&self.header, entries))
    }

    fn write_header<W: Write>(&self, entries: &[IpkFileEntry], output: &mut W) -> Result<()> {
        writer::write_ipk_header(output, &self.header, entries)
    }
}
