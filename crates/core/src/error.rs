//! Error types for store operations.

use thiserror::Error;

/// All store errors.
///
/// Backends map their internal failures onto these variants so callers
/// (the bridge, the facade, the CLI) see one stable error surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Constraint violation (limits exceeded, invalid input)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// On-disk data failed validation (bad magic, checksum mismatch)
    #[error("corruption: {0}")]
    Corruption(String),

    /// Backend-specific storage failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Store was closed and can no longer be used
    #[error("store is closed")]
    Closed,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a corruption error.
    ///
    /// Corruption means the store should not be trusted for further writes
    /// without operator intervention.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}
