//! Member compression used by the archive dialects

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::config::{ArchiveFormat, ArchiveSettings};
use crate::error::{Error, Result};
use crate::utils::binary::MAX_PREALLOC;

/// Compression method applied to archive members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    None,
    Zlib,
}

impl CompressionMethod {
    /// Method a dialect uses for members on its compression allow-list
    #[must_use]
    pub fn for_settings(settings: &ArchiveSettings) -> Self {
        match settings.format {
            ArchiveFormat::Ipk => CompressionMethod::Zlib,
            ArchiveFormat::Cnt => CompressionMethod::None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zlib => "zlib",
        }
    }

    /// Compress member bytes
    ///
    /// # Errors
    /// Returns [`Error::Compression`] when the encoder fails.
    pub fn compress(self, data: &[u8], path: &str) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::None => Ok(data.to_vec()),
            CompressionMethod::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(data)
                    .and_then(|()| encoder.finish())
                    .map_err(|e| Error::Compression {
                        path: path.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    }

    /// Decompress member bytes, checking the result against the declared size
    ///
    /// # Errors
    /// Returns [`Error::Decompression`] for corrupt data or a size mismatch.
    pub fn decompress(self, data: &[u8], expected_size: usize, path: &str) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::None => Ok(data.to_vec()),
            CompressionMethod::Zlib => {
                // One byte past the declared size is enough to detect an overrun
                let mut decoder = ZlibDecoder::new(data).take(expected_size as u64 + 1);
                let mut result = Vec::with_capacity(expected_size.min(MAX_PREALLOC));
                decoder
                    .read_to_end(&mut result)
                    .map_err(|e| Error::Decompression {
                        path: path.to_string(),
                        message: format!("zlib: {e}"),
                    })?;

                if result.len() != expected_size {
                    return Err(Error::Decompression {
                        path: path.to_string(),
                        message: format!(
                            "expected {expected_size} bytes, got {}",
                            result.len()
                        ),
                    });
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;

    #[test]
    fn test_zlib_round_trip() {
        let data = b"ubiart ubiart ubiart ubiart ubiart".repeat(8);
        let method = CompressionMethod::for_settings(&ArchiveSettings::ubiart(Platform::Pc));
        assert_eq!(method, CompressionMethod::Zlib);
        assert_eq!(
            CompressionMethod::for_settings(&ArchiveSettings::openspace()),
            CompressionMethod::None
        );
        let packed = method.compress(&data, "a.ckd").unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(method.decompress(&packed, data.len(), "a.ckd").unwrap(), data);
    }

    #[test]
    fn test_size_mismatch_and_garbage() {
        let method = CompressionMethod::Zlib;
        let packed = method.compress(b"hello", "a").unwrap();
        assert!(matches!(
            method.decompress(&packed, 4, "a"),
            Err(Error::Decompression { .. })
        ));
        assert!(matches!(
            method.decompress(&[1, 2, 3, 4], 4, "a"),
            Err(Error::Decompression { .. })
        ));
    }

    #[test]
    fn test_declared_size_far_beyond_stream() {
        let method = CompressionMethod::Zlib;
        let packed = method.compress(b"tiny", "a").unwrap();
        assert!(matches!(
            method.decompress(&packed, usize::MAX / 4, "a"),
            Err(Error::Decompression { .. })
        ));

        // Output past the declared size stops the decoder early
        let big = method.compress(&[7u8; 4096], "b").unwrap();
        assert!(matches!(
            method.decompress(&big, 16, "b"),
            Err(Error::Decompression { .. })
        ));
    }
}
