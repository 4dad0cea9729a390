use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a [`super::GroupFetcher`].
pub enum FetchError {
    /// The response was missing, carried an `error` member, or was malformed.
    #[error("invalid VK API response: {0}")]
    Validation(String),

    /// The request could not be sent or the body could not be read.
    #[error("VK API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("VK API returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// `fetch_batch` was called with no ids.
    #[error("batch is empty")]
    EmptyBatch,

    /// `fetch_batch` was called with more ids than one request may carry.
    #[error("batch of {size} ids exceeds the limit of {max}")]
    BatchTooLarge {
        /// Requested batch size.
        size: usize,
        /// Configured limit.
        max: usize,
    },
}

impl FetchError {
    /// Returns `true` for malformed or erroring responses.
    pub fn is_validation(&self) -> bool {
        matches!(self, FetchError::Validation(_))
    }
}

/// Convenience result type for remote fetches.
pub type FetchResult<T> = Result<T, FetchError>;
