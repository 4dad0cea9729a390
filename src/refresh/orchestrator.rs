use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, instrument};

use super::error::{RefreshError, RefreshResult};
use crate::store::GroupStore;

/// Hands a batch of ids to whatever executes refreshes. Must not wait for the
/// batch to complete.
#[async_trait]
pub trait BatchDispatcher: Send + Sync {
    async fn dispatch(&self, batch: Vec<i64>) -> RefreshResult<()>;

    /// Largest batch the executor accepts, if it has a limit.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

/// Outcome of one orchestrator run. Counts what was scheduled, not what
/// completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Ids handed to the dispatcher.
    pub scheduled: usize,
    /// Batches dispatched.
    pub batches: usize,
    /// Rows last updated at or before this instant were scheduled.
    pub cutoff: DateTime<Utc>,
}

impl std::fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scheduled {} groups for refresh in {} batches (last updated at or before {})",
            self.scheduled,
            self.batches,
            self.cutoff.to_rfc3339()
        )
    }
}

pub struct RefreshOrchestrator {
    store: Arc<dyn GroupStore>,
    dispatcher: Arc<dyn BatchDispatcher>,
    staleness: TimeDelta,
    max_batch_size: usize,
}

impl RefreshOrchestrator {
    /// Fails if `max_batch_size` is zero or larger than the dispatcher's limit.
    pub fn new(
        store: Arc<dyn GroupStore>,
        dispatcher: Arc<dyn BatchDispatcher>,
        staleness: Duration,
        max_batch_size: usize,
    ) -> RefreshResult<Self> {
        if max_batch_size == 0 {
            return Err(RefreshError::InvalidBatchSize);
        }
        if let Some(max) = dispatcher.max_batch_size()
            && max_batch_size > max
        {
            return Err(RefreshError::BatchSizeExceedsFetcher {
                size: max_batch_size,
                max,
            });
        }
        let staleness = TimeDelta::from_std(staleness).map_err(|_| RefreshError::InvalidStaleness)?;

        Ok(Self {
            store,
            dispatcher,
            staleness,
            max_batch_size,
        })
    }

    pub async fn run(&self) -> RefreshResult<RefreshSummary> {
        self.run_at(Utc::now()).await
    }

    /// Dispatches every row last updated at or before `now - staleness`.
    #[instrument(skip(self))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> RefreshResult<RefreshSummary> {
        let cutoff = now
            .checked_sub_signed(self.staleness)
            .ok_or(RefreshError::InvalidStaleness)?;

        let mut ids = self.store.stale_ids(cutoff).await?;
        // Stable batch membership between runs.
        ids.sort_unstable();

        let scheduled = ids.len();
        let mut batches = 0;
        let mut batch = Vec::with_capacity(self.max_batch_size.min(scheduled));

        for id in ids {
            batch.push(id);
            if batch.len() == self.max_batch_size {
                self.dispatch(std::mem::take(&mut batch), &mut batches).await?;
            }
        }
        if !batch.is_empty() {
            self.dispatch(batch, &mut batches).await?;
        }

        let summary = RefreshSummary {
            scheduled,
            batches,
            cutoff,
        };
        info!(scheduled, batches, "Refresh run dispatched");
        Ok(summary)
    }

    async fn dispatch(&self, batch: Vec<i64>, batches: &mut usize) -> RefreshResult<()> {
        debug!(batch_size = batch.len(), "Dispatching refresh batch");
        self.dispatcher.dispatch(batch).await?;
        *batches += 1;
        Ok(())
    }
}
