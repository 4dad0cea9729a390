//! Networked fast cache backed by Redis.
//!
//! Rows are stored as JSON strings under `strata:group:{id}` with no expiry.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, instrument};

use super::GroupCache;
use super::error::{CacheError, CacheResult};
use crate::group::GroupRecord;

const KEY_PREFIX: &str = "strata:group:";

/// Shared Redis cache. Cloning reuses the same reconnecting connection.
#[derive(Clone)]
pub struct RedisGroupCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisGroupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisGroupCache").finish_non_exhaustive()
    }
}

impl RedisGroupCache {
    /// Opens `url` (`redis://host:port/db`) and waits for the first connection.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        debug!("Connected to Redis cache");
        Ok(Self { conn })
    }
}

fn unavailable(e: redis::RedisError) -> CacheError {
    CacheError::Unavailable(e.to_string())
}

pub(crate) fn cache_key(id: i64) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

pub(crate) fn encode(record: &GroupRecord) -> CacheResult<String> {
    serde_json::to_string(record).map_err(|e| CacheError::Corrupt {
        id: record.id,
        reason: e.to_string(),
    })
}

pub(crate) fn decode(id: i64, raw: &str) -> CacheResult<GroupRecord> {
    let record: GroupRecord = serde_json::from_str(raw).map_err(|e| CacheError::Corrupt {
        id,
        reason: e.to_string(),
    })?;
    if record.id != id {
        return Err(CacheError::Corrupt {
            id,
            reason: format!("entry holds group {}", record.id),
        });
    }
    Ok(record)
}

#[async_trait]
impl GroupCache for RedisGroupCache {
    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> CacheResult<Option<GroupRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(cache_key(id)).await.map_err(unavailable)?;
        raw.map(|raw| decode(id, &raw)).transpose()
    }

    #[instrument(skip(self, record), fields(group_id = record.id))]
    async fn set(&self, record: &GroupRecord) -> CacheResult<()> {
        let value = encode(record)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(cache_key(record.id), value)
            .await
            .map_err(unavailable)
    }
}
