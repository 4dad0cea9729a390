//! Durable group store: the authoritative record of what was confirmed and when.
//!
//! [`GroupStore`] is the seam used by the pipeline and the refresh path.
//! [`FileGroupStore`] keeps one rkyv file per group; [`MemoryGroupStore`] keeps
//! everything in a map.

pub mod error;
pub mod file;
pub mod memory;
mod model;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::group::{GroupRecord, StoredGroup};

pub use error::{StoreError, StoreResult};
pub use file::FileGroupStore;
pub use memory::MemoryGroupStore;
pub use model::{ArchivedStoredRecord, StoredRecord};

/// Keyed durable storage of [`StoredGroup`] rows.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Point lookup. `Ok(None)` means the id was never stored.
    async fn get(&self, id: i64) -> StoreResult<Option<StoredGroup>>;

    /// Inserts a new row confirmed at `at`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the id is already stored.
    async fn create(&self, record: &GroupRecord, at: DateTime<Utc>) -> StoreResult<StoredGroup>;

    /// Overwrites `name`, `member_count` and `updated_at` for every record
    /// whose id is already stored. Unknown ids are skipped. Returns the number
    /// of rows updated; a row that cannot be written is logged and left out of
    /// the count rather than failing the rest of the batch.
    async fn bulk_update(&self, records: &[GroupRecord], at: DateTime<Utc>) -> StoreResult<usize>;

    /// Ids of every row with `updated_at <= cutoff`, in no particular order.
    async fn stale_ids(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<i64>>;
}
