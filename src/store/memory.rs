//! Map-backed durable store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::GroupStore;
use super::error::{StoreError, StoreResult};
use crate::group::{GroupRecord, StoredGroup};

/// Process-local [`GroupStore`]. Clones share the same rows.
#[derive(Debug, Default, Clone)]
pub struct MemoryGroupStore {
    rows: Arc<RwLock<HashMap<i64, StoredGroup>>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a row directly.
    pub fn insert(&self, stored: StoredGroup) {
        self.rows.write().insert(stored.id(), stored);
    }

    pub fn row(&self, id: i64) -> Option<StoredGroup> {
        self.rows.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// All rows sorted by id.
    pub fn snapshot(&self) -> Vec<StoredGroup> {
        let mut rows: Vec<StoredGroup> = self.rows.read().values().cloned().collect();
        rows.sort_by_key(StoredGroup::id);
        rows
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn get(&self, id: i64) -> StoreResult<Option<StoredGroup>> {
        Ok(self.row(id))
    }

    async fn create(&self, record: &GroupRecord, at: DateTime<Utc>) -> StoreResult<StoredGroup> {
        let mut rows = self.rows.write();
        if rows.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists { id: record.id });
        }
        let stored = StoredGroup::new(record.clone(), at);
        rows.insert(record.id, stored.clone());
        Ok(stored)
    }

    async fn bulk_update(&self, records: &[GroupRecord], at: DateTime<Utc>) -> StoreResult<usize> {
        let mut rows = self.rows.write();
        let mut updated = 0;
        for record in records {
            if let Some(row) = rows.get_mut(&record.id) {
                row.record.name = record.name.clone();
                row.record.member_count = record.member_count;
                row.updated_at = at;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn stale_ids(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<i64>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| row.is_stale(cutoff))
            .map(StoredGroup::id)
            .collect())
    }
}
