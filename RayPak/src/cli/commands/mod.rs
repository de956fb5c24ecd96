//! Subcommand definitions and dispatch

pub mod convert;
pub mod extract;
pub mod info;
pub mod list;
pub mod repack;

use std::path::PathBuf;

use clap::Subcommand;

use super::{ArchiveArgs, PlatformArg};

#[derive(Subcommand)]
pub enum Commands {
    /// List archive contents
    List {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Only list files matching glob pattern (e.g., "*.gf", "textures/*")
        #[arg(long)]
        filter: Option<String>,
    },

    /// Extract archive members
    Extract {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Output directory
        #[arg(short, long)]
        destination: PathBuf,

        /// Extract a single file by internal path
        #[arg(long)]
        file: Option<String>,

        /// Convert the single extracted file to this format (e.g., png)
        #[arg(long = "as", requires = "file")]
        as_format: Option<String>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show file types and texture info of archive members
    Info {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Only show this internal path
        #[arg(long)]
        file: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Convert a standalone texture or image file
    Convert {
        /// Source file
        #[arg(short, long)]
        source: PathBuf,

        /// Destination file; its extension selects the output format
        #[arg(short, long)]
        destination: PathBuf,

        /// Generate mipmaps when the output format stores them (gf, dds)
        #[arg(long)]
        mipmaps: bool,

        /// Platform of cooked textures (.ckd)
        #[arg(long, value_enum, default_value_t = PlatformArg::Pc)]
        platform: PlatformArg,
    },

    /// Rebuild an archive with replaced, added or removed members
    Repack {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Replace or add a member: ARCHIVE_PATH=FILE (the file is converted to the member's format)
        #[arg(long = "import", value_name = "ARCHIVE_PATH=FILE")]
        imports: Vec<String>,

        /// Import every file below this directory at its relative path, stored as is
        #[arg(long, value_name = "DIR")]
        from_dir: Option<PathBuf>,

        /// Remove a member by internal path
        #[arg(long, value_name = "ARCHIVE_PATH")]
        remove: Vec<String>,

        /// Write to this file instead of replacing the source
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::List {
                archive,
                json,
                filter,
            } => list::execute(archive, *json, filter.as_deref()),
            Commands::Extract {
                archive,
                destination,
                file,
                as_format,
                quiet,
            } => extract::execute(
                archive,
                destination,
                file.as_deref(),
                as_format.as_deref(),
                *quiet,
            ),
            Commands::Info { archive, file, json } => info::execute(archive, file.as_deref(), *json),
            Commands::Convert {
                source,
                destination,
                mipmaps,
                platform,
            } => convert::execute(source, destination, *mipmaps, (*platform).into()),
            Commands::Repack {
                archive,
                imports,
                from_dir,
                remove,
                output,
            } => repack::execute(archive, imports, from_dir.as_deref(), remove, output.as_deref()),
        }
    }
}
