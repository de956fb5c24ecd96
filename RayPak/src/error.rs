//! Error types for `RayPak`

use thiserror::Error;

/// The error type for `RayPak` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from stream or file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Archive Container Errors ====================
    /// A header field is outside the known set for the selected dialect.
    #[error("malformed archive header: {message}")]
    MalformedHeader {
        /// Which field was rejected and why.
        message: String,
    },

    /// The stream ends before the data the header declares.
    #[error("truncated stream: expected at least {expected} bytes, found {actual}")]
    TruncatedStream {
        /// Number of bytes the header or entry requires.
        expected: u64,
        /// Number of bytes actually available.
        actual: u64,
    },

    /// The requested member does not exist in the archive.
    #[error("file not found in archive: {0}")]
    FileNotFoundInArchive(String),

    // ==================== Compression Errors ====================
    /// Member compression failed. A repack never falls back to storing silently.
    #[error("compression failed for {path}: {message}")]
    Compression {
        /// Archive path of the member.
        path: String,
        /// The underlying error message.
        message: String,
    },

    /// Member decompression failed.
    #[error("decompression failed for {path}: {message}")]
    Decompression {
        /// Archive path of the member.
        path: String,
        /// The underlying error message.
        message: String,
    },

    // ==================== Codec Errors ====================
    /// The operation is not available for this format (e.g. encoding a read-only console texture).
    #[error("{operation} is not supported for {format}")]
    UnsupportedOperation {
        /// Format or file type name.
        format: String,
        /// The rejected operation.
        operation: String,
    },

    /// The bytes do not decode as the classified format.
    #[error("failed to decode {format}: {message}")]
    CodecDecode {
        /// Format name.
        format: String,
        /// What went wrong.
        message: String,
    },

    /// Encoding into the target format failed.
    #[error("failed to encode {format}: {message}")]
    ImageEncode {
        /// Format name.
        format: String,
        /// What went wrong.
        message: String,
    },

    /// A raw pixel buffer does not match its declared dimensions.
    #[error("invalid image buffer: expected {expected} bytes, found {actual}")]
    InvalidImageBuffer {
        /// `width * height * bytes_per_pixel`.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    // ==================== Programming Errors ====================
    /// An internal ordering or bookkeeping invariant was broken. Indicates a bug in the caller.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    // ==================== Configuration Errors ====================
    /// The archive settings file could not be parsed.
    #[error("invalid settings: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedHeader {
            message: message.into(),
        }
    }

    pub(crate) fn decode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CodecDecode {
            format: format.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(format: impl Into<String>, operation: impl Into<String>) -> Self {
        Error::UnsupportedOperation {
            format: format.into(),
            operation: operation.into(),
        }
    }

    /// Returns true for errors caused by a single member's content rather than the container or I/O.
    ///
    /// These are the errors the file-type layer absorbs by substituting the error type.
    #[must_use]
    pub fn is_codec_error(&self) -> bool {
        match self {
            Error::CodecDecode { .. }
            | Error::InvalidImageBuffer { .. }
            | Error::Decompression { .. }
            | Error::TruncatedStream { .. } => true,
            // Members are decoded from memory, so a short read means short content
            Error::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// A specialized Result type for `RayPak` operations.
pub type Result<T> = std::result::Result<T, Error>;
