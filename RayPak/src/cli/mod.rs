//! `RayPak` CLI - command-line interface for archive and texture tools

pub mod commands;
pub mod progress;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};
use commands::Commands;

use crate::config::{ArchiveFormat, ArchiveSettings, Platform};

#[derive(Parser)]
#[command(name = "raypak")]
#[command(about = "RayPak: IPK/CNT archive and texture tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Archive dialect on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Ipk,
    Cnt,
}

/// Cooking platform on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PlatformArg {
    #[default]
    Pc,
    Xbox360,
    Ps3,
    PsVita,
    Wii,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Pc => Platform::Pc,
            PlatformArg::Xbox360 => Platform::Xbox360,
            PlatformArg::Ps3 => Platform::Ps3,
            PlatformArg::PsVita => Platform::PsVita,
            PlatformArg::Wii => Platform::Wii,
        }
    }
}

/// Options selecting how an archive is read
#[derive(Debug, Clone, Args)]
pub struct ArchiveArgs {
    /// Archive file
    #[arg(short, long)]
    pub source: PathBuf,

    /// Settings file (TOML); overrides --format and --platform
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Archive dialect (detected from the extension if not specified)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Platform the archive was cooked for
    #[arg(long, value_enum, default_value_t = PlatformArg::Pc)]
    pub platform: PlatformArg,
}

impl ArchiveArgs {
    /// Resolve archive settings from the flags
    pub fn settings(&self) -> anyhow::Result<ArchiveSettings> {
        if let Some(path) = &self.settings {
            return Ok(ArchiveSettings::from_toml_file(path)?);
        }
        let format = match self.format {
            Some(FormatArg::Ipk) => ArchiveFormat::Ipk,
            Some(FormatArg::Cnt) => ArchiveFormat::Cnt,
            None => detect_format(&self.source)?,
        };
        Ok(match format {
            ArchiveFormat::Ipk => ArchiveSettings::ubiart(self.platform.into()),
            ArchiveFormat::Cnt => ArchiveSettings::openspace(),
        })
    }
}

fn detect_format(path: &Path) -> anyhow::Result<ArchiveFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "ipk" => Ok(ArchiveFormat::Ipk),
        "cnt" => Ok(ArchiveFormat::Cnt),
        _ => anyhow::bail!(
            "Cannot detect archive format of {}; pass --format or --settings",
            path.display()
        ),
    }
}

/// Run the `RayPak` CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
