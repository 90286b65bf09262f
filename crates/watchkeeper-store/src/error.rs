//! Store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Alert store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Store contents could not be parsed.
    #[error("Corrupt alert store at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Another invocation held the store lock for too long.
    #[error("Timed out after {waited_ms}ms waiting for store lock {path}")]
    LockTimeout { path: PathBuf, waited_ms: u128 },

    /// Locking failed for a reason other than contention.
    #[error("Failed to lock {path}: {reason}")]
    Lock { path: PathBuf, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
