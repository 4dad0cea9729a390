//! One batch: one remote call, one store write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::error::RefreshResult;
use crate::group::GroupRecord;
use crate::remote::GroupFetcher;
use crate::store::GroupStore;

#[derive(Clone)]
pub struct BatchRefresher {
    fetcher: Arc<dyn GroupFetcher>,
    store: Arc<dyn GroupStore>,
}

impl BatchRefresher {
    pub fn new(fetcher: Arc<dyn GroupFetcher>, store: Arc<dyn GroupStore>) -> Self {
        Self { fetcher, store }
    }

    /// Per-call limit of the underlying fetcher.
    pub fn max_batch_size(&self) -> usize {
        self.fetcher.max_batch_size()
    }

    /// Refreshes `ids` and returns the number of rows updated.
    ///
    /// A failed fetch fails the whole batch and leaves the store untouched.
    pub async fn refresh_batch(&self, ids: &[i64]) -> RefreshResult<usize> {
        self.refresh_batch_at(ids, Utc::now()).await
    }

    #[instrument(skip(self, ids), fields(batch_size = ids.len()))]
    pub async fn refresh_batch_at(&self, ids: &[i64], at: DateTime<Utc>) -> RefreshResult<usize> {
        let fetched = self.fetcher.fetch_batch(ids).await?;

        let requested: HashSet<i64> = ids.iter().copied().collect();
        let (records, unexpected): (Vec<GroupRecord>, Vec<GroupRecord>) = fetched
            .into_iter()
            .partition(|record| requested.contains(&record.id));
        if !unexpected.is_empty() {
            warn!(
                count = unexpected.len(),
                "VK returned groups that were not requested"
            );
        }

        let updated = self.store.bulk_update(&records, at).await?;
        info!(
            requested = ids.len(),
            returned = records.len(),
            updated,
            "Refreshed group batch"
        );
        Ok(updated)
    }
}
