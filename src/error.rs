//! Unified error types for rollout-kv.
//!
//! Wraps the store, bridge and configuration errors behind one enum so
//! callers of the facade match on a single type.

use thiserror::Error;

use crate::config::ConfigError;

/// All rollout-kv errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Constraint violation (limits exceeded, invalid input)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// On-disk data failed validation
    #[error("corruption: {0}")]
    Corruption(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Store or bridge has been closed
    #[error("closed: {0}")]
    Closed(String),

    /// Bridge call could not be dispatched
    #[error("bridge error: {0}")]
    Bridge(String),

    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for rollout-kv operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// Check if the store or bridge was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed(_))
    }
}

// Convert from store errors
impl From<rollout_kv_core::Error> for Error {
    fn from(e: rollout_kv_core::Error) -> Self {
        use rollout_kv_core::Error as CoreError;
        match e {
            CoreError::ConstraintViolation(msg) => Error::ConstraintViolation(msg),
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Corruption(msg) => Error::Corruption(msg),
            CoreError::Storage(msg) => Error::Storage(msg),
            CoreError::Closed => Error::Closed("store is closed".into()),
        }
    }
}

// Convert from bridge errors
impl From<rollout_kv_bridge::BridgeError> for Error {
    fn from(e: rollout_kv_bridge::BridgeError) -> Self {
        use rollout_kv_bridge::BridgeError as BE;
        match e {
            BE::Storage(inner) => inner.into(),
            BE::Shutdown => Error::Closed(BE::Shutdown.to_string()),
            BE::Spawn(io_err) => Error::Io(io_err),
            other => Error::Bridge(other.to_string()),
        }
    }
}
