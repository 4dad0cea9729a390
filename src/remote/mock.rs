//! In-memory [`GroupFetcher`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{FetchError, FetchResult};
use super::{GroupFetcher, check_batch};
use crate::config::DEFAULT_MAX_BATCH_SIZE;
use crate::group::GroupRecord;

#[derive(Default)]
struct MockState {
    groups: Mutex<HashMap<i64, GroupRecord>>,
    failing: Mutex<HashSet<i64>>,
    batches: Mutex<Vec<Vec<i64>>>,
    fail_all: AtomicBool,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

/// Serves groups from a map. A call fails with a validation error if any of its
/// ids was marked failing or if [`MockGroupFetcher::fail_all`] is set.
#[derive(Clone)]
pub struct MockGroupFetcher {
    state: Arc<MockState>,
    max_batch_size: usize,
}

impl Default for MockGroupFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGroupFetcher {
    pub fn new() -> Self {
        Self::with_max_batch_size(DEFAULT_MAX_BATCH_SIZE)
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            state: Arc::new(MockState::default()),
            max_batch_size,
        }
    }

    pub fn insert(&self, record: GroupRecord) {
        self.state.groups.lock().insert(record.id, record);
    }

    /// Makes every call that includes `id` fail.
    pub fn fail_id(&self, id: i64) {
        self.state.failing.lock().insert(id);
    }

    pub fn fail_all(&self, fail: bool) {
        self.state.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn single_calls(&self) -> usize {
        self.state.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.state.batch_calls.load(Ordering::SeqCst)
    }

    /// Total calls of either kind.
    pub fn calls(&self) -> usize {
        self.single_calls() + self.batch_calls()
    }

    /// Id lists passed to `fetch_batch`, in call order.
    pub fn batches(&self) -> Vec<Vec<i64>> {
        self.state.batches.lock().clone()
    }

    fn check_failure(&self, ids: &[i64]) -> FetchResult<()> {
        if self.state.fail_all.load(Ordering::SeqCst) {
            return Err(FetchError::Validation("mock failure".to_string()));
        }
        let failing = self.state.failing.lock();
        if let Some(id) = ids.iter().find(|id| failing.contains(id)) {
            return Err(FetchError::Validation(format!("mock failure for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl GroupFetcher for MockGroupFetcher {
    async fn fetch_one(&self, id: i64) -> FetchResult<GroupRecord> {
        self.state.single_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(&[id])?;
        self.state
            .groups
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::Validation(format!("empty `response` for {}", id)))
    }

    async fn fetch_batch(&self, ids: &[i64]) -> FetchResult<Vec<GroupRecord>> {
        self.state.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.state.batches.lock().push(ids.to_vec());
        check_batch(ids, self.max_batch_size)?;
        self.check_failure(ids)?;

        let groups = self.state.groups.lock();
        let records: Vec<GroupRecord> = ids.iter().filter_map(|id| groups.get(id).cloned()).collect();
        if records.is_empty() {
            return Err(FetchError::Validation("empty `response`".to_string()));
        }
        Ok(records)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
