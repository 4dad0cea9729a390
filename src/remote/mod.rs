//! VK API access: the slowest lookup tier and the source of truth for refreshes.
//!
//! [`GroupFetcher`] is the seam used by the pipeline and the refresh worker.
//! [`VkClient`] is the HTTP implementation; [`MockGroupFetcher`] is available
//! behind `#[cfg(any(test, feature = "mock"))]`.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod response;


use async_trait::async_trait;

use crate::group::GroupRecord;

pub use client::{VkClient, VkClientConfig};
pub use error::{FetchError, FetchResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGroupFetcher;
pub use response::{parse_batch, parse_single};

/// Default VK API method base URL.
pub const DEFAULT_API_URL: &str = "https://api.vk.com/method";
/// API version pinned for `groups.getById` (response is a bare array).
pub const DEFAULT_API_VERSION: &str = "5.131";
/// Method used for both single and batch lookups.
pub const GET_BY_ID_METHOD: &str = "groups.getById";
/// Fields requested for every group.
pub const GROUP_FIELDS: &str = "id,members_count,name";

/// Fetches validated group records from the remote API.
///
/// One invocation is exactly one outbound request. Implementations never retry
/// and never split a batch.
#[async_trait]
pub trait GroupFetcher: Send + Sync {
    /// Fetches a single group. The response must contain exactly one entry.
    async fn fetch_one(&self, id: i64) -> FetchResult<GroupRecord>;

    /// Fetches every id in `ids` with one request.
    async fn fetch_batch(&self, ids: &[i64]) -> FetchResult<Vec<GroupRecord>>;

    /// Largest batch accepted by [`GroupFetcher::fetch_batch`].
    fn max_batch_size(&self) -> usize;
}

/// Rejects batches the remote cannot take in one call.
pub(crate) fn check_batch(ids: &[i64], max: usize) -> FetchResult<()> {
    if ids.is_empty() {
        return Err(FetchError::EmptyBatch);
    }
    if ids.len() > max {
        return Err(FetchError::BatchTooLarge {
            size: ids.len(),
            max,
        });
    }
    Ok(())
}
