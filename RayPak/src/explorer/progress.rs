//! Progress reporting for session batch operations

/// Callback invoked once per processed item
pub type ProgressCallback<'a> = &'a dyn Fn(&SessionProgress);

/// Position of a batch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// Current item number (1-indexed)
    pub current: usize,
    pub total: usize,
    /// Archive path of the current member
    pub current_file: String,
}

impl SessionProgress {
    #[must_use]
    pub fn new(current: usize, total: usize, file: impl Into<String>) -> Self {
        Self {
            current,
            total,
            current_file: file.into(),
        }
    }
}
