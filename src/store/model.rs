//! On-disk row format.

use chrono::{DateTime, Utc};
use rkyv::{Archive, Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use crate::group::{GroupRecord, StoredGroup};

/// Group row persisted to disk as `rkyv` bytes.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub name: String,
    pub member_count: i64,
    /// Unix timestamp (milliseconds) of the last upstream confirmation.
    pub updated_at: i64,
}

impl StoredRecord {
    pub fn new(record: &GroupRecord, at: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            member_count: record.member_count,
            updated_at: at.timestamp_millis(),
        }
    }

    pub fn updated_at(&self) -> StoreResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.updated_at).ok_or_else(|| StoreError::Corrupt {
            id: self.id,
            reason: format!("timestamp {} out of range", self.updated_at),
        })
    }

    pub fn into_stored(self) -> StoreResult<StoredGroup> {
        let updated_at = self.updated_at()?;
        Ok(StoredGroup::new(
            GroupRecord {
                id: self.id,
                name: self.name,
                member_count: self.member_count,
            },
            updated_at,
        ))
    }
}

impl From<&StoredGroup> for StoredRecord {
    fn from(stored: &StoredGroup) -> Self {
        Self::new(&stored.record, stored.updated_at)
    }
}
