use std::time::Duration;

use thiserror::Error;

use crate::remote::FetchError;
use crate::store::StoreError;

/// Errors from the refresh path.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The batch fetch failed; the whole batch is abandoned.
    #[error("batch fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Reading stale ids or writing refreshed rows failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A batch was dispatched after the queue shut down.
    #[error("refresh queue is closed")]
    QueueClosed,

    /// Orchestrator configured with a zero batch size.
    #[error("max batch size must be greater than zero")]
    InvalidBatchSize,

    /// Orchestrator batches would exceed what the fetcher accepts per call.
    #[error("batch size {size} exceeds the fetcher limit of {max}")]
    BatchSizeExceedsFetcher {
        /// Configured orchestrator batch size.
        size: usize,
        /// Fetcher's per-call limit.
        max: usize,
    },

    /// Staleness window does not fit a timestamp offset.
    #[error("staleness interval out of range")]
    InvalidStaleness,

    /// Scheduler period is zero or too large to schedule.
    #[error("refresh interval {0:?} cannot be scheduled")]
    InvalidInterval(Duration),
}

/// Convenience result type for refresh operations.
pub type RefreshResult<T> = Result<T, RefreshError>;
