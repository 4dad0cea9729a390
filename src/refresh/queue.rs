//! Worker pool that executes dispatched refresh batches.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::error::{RefreshError, RefreshResult};
use super::orchestrator::BatchDispatcher;
use super::worker::BatchRefresher;

/// Running totals across every batch the queue has executed.
#[derive(Debug, Default)]
pub struct RefreshStats {
    batches_completed: AtomicU64,
    batches_failed: AtomicU64,
    groups_updated: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshStatsSnapshot {
    pub batches_completed: u64,
    pub batches_failed: u64,
    pub groups_updated: u64,
}

impl RefreshStats {
    pub fn snapshot(&self) -> RefreshStatsSnapshot {
        RefreshStatsSnapshot {
            batches_completed: self.batches_completed.load(Ordering::Acquire),
            batches_failed: self.batches_failed.load(Ordering::Acquire),
            groups_updated: self.groups_updated.load(Ordering::Acquire),
        }
    }

    fn record_success(&self, updated: usize) {
        self.groups_updated
            .fetch_add(updated as u64, Ordering::AcqRel);
        self.batches_completed.fetch_add(1, Ordering::AcqRel);
    }

    fn record_failure(&self) {
        self.batches_failed.fetch_add(1, Ordering::AcqRel);
    }
}

/// Unbounded batch queue drained by `workers` tokio tasks.
///
/// Batches run independently and in no particular order; a failed batch is
/// logged and counted, never retried.
pub struct RefreshQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Vec<i64>>>>,
    max_batch_size: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<RefreshStats>,
}

impl RefreshQueue {
    /// Spawns the worker pool. Must be called inside a tokio runtime.
    pub fn start(refresher: BatchRefresher, workers: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Vec<i64>>();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let stats = Arc::new(RefreshStats::default());
        let max_batch_size = refresher.max_batch_size();

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let refresher = refresher.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(batch) = next else { break };

                        match refresher.refresh_batch(&batch).await {
                            Ok(updated) => stats.record_success(updated),
                            Err(e) => {
                                error!(
                                    worker,
                                    batch_size = batch.len(),
                                    first_id = batch.first().copied(),
                                    error = %e,
                                    "Refresh batch failed"
                                );
                                stats.record_failure();
                            }
                        }
                    }
                    debug!(worker, "Refresh worker stopped");
                })
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            max_batch_size,
            workers: Mutex::new(handles),
            stats,
        }
    }

    pub fn stats(&self) -> Arc<RefreshStats> {
        Arc::clone(&self.stats)
    }

    /// Stops accepting batches and waits for queued and in-flight ones to finish.
    pub async fn shutdown(&self) -> RefreshStatsSnapshot {
        drop(self.sender.lock().take());
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());

        for result in futures_util::future::join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Refresh worker panicked");
            }
        }

        let snapshot = self.stats.snapshot();
        info!(
            completed = snapshot.batches_completed,
            failed = snapshot.batches_failed,
            updated = snapshot.groups_updated,
            "Refresh queue drained"
        );
        snapshot
    }
}

impl std::fmt::Debug for RefreshQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshQueue")
            .field("open", &self.sender.lock().is_some())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

#[async_trait]
impl BatchDispatcher for RefreshQueue {
    async fn dispatch(&self, batch: Vec<i64>) -> RefreshResult<()> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(RefreshError::QueueClosed)?;
        sender.send(batch).map_err(|_| RefreshError::QueueClosed)
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(self.max_batch_size)
    }
}
