//! Archive settings: dialect selection and compression policy
//!
//! Settings pick the engine dialect an archive is read with, the platform its
//! textures were cooked for, and which members are compressed on write.
//!
//! ```toml
//! format = "ipk"
//! platform = "xbox360"
//! compressed_extensions = ["ckd", "isc", "tpl"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::FileExtension;

/// Archive container dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// UbiArt `.ipk` packed archive (big-endian, zlib-compressed members)
    Ipk,
    /// OpenSpace `.cnt` texture container (little-endian, XOR-obfuscated members)
    Cnt,
}

impl ArchiveFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ipk => "ipk",
            Self::Cnt => "cnt",
        }
    }
}

/// Platform the archive contents were cooked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Pc,
    Xbox360,
    Ps3,
    PsVita,
    Wii,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Xbox360 => "Xbox 360",
            Self::Ps3 => "PS3",
            Self::PsVita => "PS Vita",
            Self::Wii => "Wii",
        }
    }
}

/// Settings used to load and save an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Container dialect
    pub format: ArchiveFormat,
    /// Platform the textures inside were cooked for
    #[serde(default)]
    pub platform: Platform,
    /// Extensions whose members get compressed when written.
    ///
    /// Entries match either the last extension component (`ckd`) or the
    /// full multi-part extension (`tga.ckd`), case-insensitively.
    #[serde(default)]
    pub compressed_extensions: Vec<String>,
}

impl ArchiveSettings {
    /// Settings for UbiArt `.ipk` bundles
    #[must_use]
    pub fn ubiart(platform: Platform) -> Self {
        Self {
            format: ArchiveFormat::Ipk,
            platform,
            compressed_extensions: ["ckd", "isc", "tpl", "act", "fx", "ilu", "xml"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Settings for OpenSpace `.cnt` containers (never compressed)
    #[must_use]
    pub fn openspace() -> Self {
        Self {
            format: ArchiveFormat::Cnt,
            platform: Platform::Pc,
            compressed_extensions: Vec::new(),
        }
    }

    /// Replace the compression allow-list
    #[must_use]
    pub fn with_compressed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compressed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Whether a member at `path` should be compressed on write
    #[must_use]
    pub fn should_compress(&self, path: &str) -> bool {
        let Some(ext) = FileExtension::from_path(path) else {
            return false;
        };

        self.compressed_extensions.iter().any(|allowed| {
            let allowed = allowed.trim_start_matches('.').to_lowercase();
            allowed == ext.full() || allowed == ext.primary()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compress() {
        let settings = ArchiveSettings::ubiart(Platform::Pc).with_compressed_extensions(["png", ".TGA.ckd"]);
        assert!(settings.should_compress("dir/a.PNG"));
        assert!(settings.should_compress("world/tex.tga.ckd"));
        assert!(!settings.should_compress("world/scene.isc.ckd"));
        assert!(!settings.should_compress("root.txt"));
        assert!(!settings.should_compress("no_extension"));
    }

    #[test]
    fn test_from_toml() {
        let settings = ArchiveSettings::from_toml_str(
            "format = \"ipk\"\nplatform = \"xbox360\"\ncompressed_extensions = [\"ckd\"]\n",
        )
        .unwrap();
        assert_eq!(settings.format, ArchiveFormat::Ipk);
        assert_eq!(settings.platform, Platform::Xbox360);
        assert!(settings.should_compress("a/b.tga.ckd"));

        let minimal = ArchiveSettings::from_toml_str("format = \"cnt\"").unwrap();
        assert_eq!(minimal.platform, Platform::Pc);
        assert!(minimal.compressed_extensions.is_empty());
    }

    #[test]
    fn test_bad_toml() {
        assert!(ArchiveSettings::from_toml_str("format = \"zip\"").is_err());
    }
}
