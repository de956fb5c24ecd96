//! Hashing utilities

/// Checksum stored alongside new IPK entries.
///
/// Computed over the upper-cased, `/`-separated path so that the same member
/// hashes identically regardless of the casing or separators it was added with.
pub fn path_checksum(path: &str) -> u32 {
    let normalized = path.replace('\\', "/").to_uppercase();
    crc32fast::hash(normalized.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_checksum_is_case_and_separator_insensitive() {
        assert_eq!(path_checksum("world/tex.png"), path_checksum("WORLD\\TEX.PNG"));
        assert_ne!(path_checksum("world/a.png"), path_checksum("world/b.png"));
        assert_eq!(path_checksum(""), 0);
    }
}
