use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
/// Errors returned by a [`super::GroupStore`].
pub enum StoreError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored row could not be decoded.
    #[error("corrupt record for group {id}: {reason}")]
    Corrupt {
        /// Group id.
        id: i64,
        /// Error message.
        reason: String,
    },

    /// `create` was called for an id that is already stored.
    #[error("group {id} already exists")]
    AlreadyExists {
        /// Group id.
        id: i64,
    },

    /// Storage root path is missing/unavailable.
    #[error("storage path unavailable: {path}")]
    StorageUnavailable {
        /// Path that was unavailable.
        path: PathBuf,
    },

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
