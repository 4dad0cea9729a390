//! Fast cache tier: get/set of group records by id, no expiry.
//!
//! [`LocalGroupCache`] keeps entries in process; [`RedisGroupCache`] shares
//! them across instances.

pub mod error;
pub mod local;
pub mod redis_cache;


use async_trait::async_trait;

use crate::group::GroupRecord;

pub use error::{CacheError, CacheResult};
pub use local::{DEFAULT_CACHE_CAPACITY, LocalGroupCache};
pub use redis_cache::RedisGroupCache;

/// Low-latency keyed store of [`GroupRecord`]s.
///
/// Entries persist until overwritten (or evicted for capacity). Callers treat
/// every error as best-effort: a failed read is a miss, a failed write is logged.
#[async_trait]
pub trait GroupCache: Send + Sync {
    async fn get(&self, id: i64) -> CacheResult<Option<GroupRecord>>;

    async fn set(&self, record: &GroupRecord) -> CacheResult<()>;
}
