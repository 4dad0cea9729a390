//! In-process fast cache backed by `moka`.

use async_trait::async_trait;
use moka::sync::Cache;

use super::GroupCache;
use super::error::CacheResult;
use crate::group::GroupRecord;

/// Default max entry count.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100_000;

/// Size-bounded in-memory cache keyed by group id. No time-based expiry.
///
/// Cloning is cheap and shares the same entries.
#[derive(Clone)]
pub struct LocalGroupCache {
    entries: Cache<i64, GroupRecord>,
}

impl LocalGroupCache {
    /// Creates a cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache with a max entry capacity.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    #[inline]
    pub fn lookup(&self, id: i64) -> Option<GroupRecord> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn insert(&self, record: GroupRecord) {
        self.entries.insert(record.id, record);
    }

    #[inline]
    pub fn remove(&self, id: i64) -> Option<GroupRecord> {
        self.entries.remove(&id)
    }

    #[inline]
    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the number of cached entries (approximate until pending tasks run).
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for LocalGroupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalGroupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGroupCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl GroupCache for LocalGroupCache {
    async fn get(&self, id: i64) -> CacheResult<Option<GroupRecord>> {
        Ok(self.lookup(id))
    }

    async fn set(&self, record: &GroupRecord) -> CacheResult<()> {
        self.insert(record.clone());
        Ok(())
    }
}
