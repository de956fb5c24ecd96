//! # RayPak
//!
//! A pure-Rust library for Rayman game archives and textures.
//!
//! ## Supported Formats
//!
//! - **IPK archives** - UbiArt packed bundles with zlib-compressed members
//! - **CNT archives** - OpenSpace texture containers with XOR-obfuscated members
//! - **GF** - OpenSpace packed textures (RLE planes, palettes, 16-bit formats)
//! - **DDS** - Block-compressed desktop textures
//! - **GXT** - PS Vita textures (decode only)
//! - **Xbox 360 textures** - Tiled console textures (decode only)
//! - **Cooked textures** - UbiArt `.tga.ckd`/`.png.ckd` wrappers
//! - **PNG/JPEG/BMP/TGA** - Generic images for import and export
//!
//! ## Quick Start
//!
//! ### Browsing an Archive
//!
//! ```no_run
//! use raypak::prelude::*;
//!
//! let settings = ArchiveSettings::ubiart(Platform::Pc);
//! let session = ArchiveSession::open("bundle_pc.ipk", &settings)?;
//! for folder in session.list() {
//!     for item in folder.items {
//!         println!("{} [{}]", item.entry.path, item.file_type.name());
//!     }
//! }
//! # Ok::<(), raypak::Error>(())
//! ```
//!
//! ### Replacing a Texture
//!
//! ```no_run
//! use raypak::prelude::*;
//!
//! let settings = ArchiveSettings::ubiart(Platform::Pc);
//! let mut session = ArchiveSession::open("bundle_pc.ipk", &settings)?;
//! let png = std::fs::read("logo.png")?;
//! session.import_file("world/logo.tga.ckd", &FileExtension::new("png"), png)?;
//! session.repack("bundle_pc.ipk")?;
//! # Ok::<(), raypak::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `raypak` command-line binary

pub mod archive;
pub mod config;
pub mod error;
pub mod explorer;
pub mod file_type;
pub mod image;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    // Archive containers
    pub use crate::archive::{
        Archive, ArchiveContainer, ArchiveEntry, CntArchive, DirectoryListing, EntryInfo,
        ImportList, IpkArchive,
    };
    pub use crate::config::{ArchiveFormat, ArchiveSettings, Platform};

    // Textures
    pub use crate::image::{
        DdsImageFormat, GfImageFormat, GxtImageFormat, ImageFormat, ImageMetadata, PixelFormat,
        RawImageData, WrappedTextureFormat, Xbox360ImageFormat,
    };

    // File types and sessions
    pub use crate::explorer::{ArchiveFileItem, ArchiveFolder, ArchiveSession, CancellationToken};
    pub use crate::file_type::{FileType, FileTypeRegistry, ThumbnailData};
    pub use crate::utils::FileExtension;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
