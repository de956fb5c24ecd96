//! Utility functions

pub mod binary;
pub mod hash;
pub mod path;

pub use binary::{ReadSeek, stream_len};
pub use hash::path_checksum;
pub use path::{FileExtension, collect_files, normalize_path, relative_path, split_path};
