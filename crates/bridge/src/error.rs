//! Bridge error types.
//!
//! Only `getItem` has a rejection channel. Each error carries a stable
//! `code` the host surfaces to the application layer alongside the message.

use thiserror::Error;

/// Errors surfaced through a rejected `getItem` or a failed dispatch.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The underlying store failed
    #[error(transparent)]
    Storage(#[from] rollout_kv_core::Error),

    /// The module has shut down and no longer accepts calls
    #[error("RolloutStorage has shut down")]
    Shutdown,

    /// Method name not exported by this module
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Arguments do not match the method signature
    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments {
        /// Method called
        method: String,
        /// What was wrong
        reason: String,
    },

    /// The worker thread could not be started
    #[error("failed to start worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Stable rejection code for the host layer.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Storage(e) if e.is_corruption() => "E_CORRUPTION",
            BridgeError::Storage(_) => "E_STORAGE",
            BridgeError::Shutdown => "E_SHUTDOWN",
            BridgeError::UnknownMethod(_) => "E_UNKNOWN_METHOD",
            BridgeError::InvalidArguments { .. } => "E_INVALID_ARGS",
            BridgeError::Spawn(_) => "E_INTERNAL",
        }
    }
}
