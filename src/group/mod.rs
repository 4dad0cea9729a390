//! Canonical group record shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};


/// A group as seen by callers and held in the fast cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Externally assigned group id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Number of members at the time of the last confirmation.
    pub member_count: i64,
}

impl GroupRecord {
    pub fn new(id: i64, name: impl Into<String>, member_count: i64) -> Self {
        Self {
            id,
            name: name.into(),
            member_count,
        }
    }
}

impl std::fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A durable-store row: the record plus the time it was last confirmed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGroup {
    pub record: GroupRecord,
    pub updated_at: DateTime<Utc>,
}

impl StoredGroup {
    pub fn new(record: GroupRecord, updated_at: DateTime<Utc>) -> Self {
        Self { record, updated_at }
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.record.id
    }

    /// Returns `true` if this row was last confirmed at or before `cutoff`.
    #[inline]
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.updated_at <= cutoff
    }

    pub fn into_record(self) -> GroupRecord {
        self.record
    }
}
