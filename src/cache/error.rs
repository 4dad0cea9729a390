use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a [`super::GroupCache`].
pub enum CacheError {
    /// The backing store could not be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded.
    #[error("corrupt cache entry for group {id}: {reason}")]
    Corrupt {
        /// Group id.
        id: i64,
        /// Error message.
        reason: String,
    },
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
