use thiserror::Error;

use super::tier::{TierError, TierKind};

#[derive(Debug, Error)]
/// Fatal lookup failures. A miss is not an error.
pub enum PipelineError {
    /// An authoritative tier failed while reading or being populated.
    #[error("{tier} tier failed: {source}")]
    Tier {
        /// Tier that failed.
        tier: TierKind,
        #[source]
        source: TierError,
    },
}

/// Convenience result type for pipeline lookups.
pub type PipelineResult<T> = Result<T, PipelineError>;
