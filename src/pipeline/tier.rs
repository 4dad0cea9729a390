//! The three lookup tiers behind one capability.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, GroupCache};
use crate::group::GroupRecord;
use crate::remote::{FetchError, GroupFetcher};
use crate::store::{GroupStore, StoreError};

/// Response header naming the tier that answered a lookup.
pub const SOURCE_HEADER: &str = "X-Strata-Source";

/// Which kind of source a [`GroupTier`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierKind {
    /// Low-latency cache (in-process or Redis).
    FastCache,
    /// Store of record that refresh scans and rewrites.
    DurableStore,
    /// The VK API.
    Remote,
}

impl TierKind {
    /// Value written to [`SOURCE_HEADER`].
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            TierKind::FastCache => "cache",
            TierKind::DurableStore => "store",
            TierKind::Remote => "remote",
        }
    }
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}

/// Error from a single tier, tagged by the tier's own error type.
#[derive(Debug, Error)]
pub enum TierError {
    /// Fast cache read or write failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Durable store read or create failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Remote fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// One source consulted by [`super::LookupPipeline`].
///
/// Errors from an authoritative tier fail the lookup. Errors from any other
/// tier are logged and treated as a miss (on read) or a skipped write (on
/// populate).
#[async_trait]
pub trait GroupTier: Send + Sync {
    /// Tier identity, used for logging and [`SOURCE_HEADER`].
    fn kind(&self) -> TierKind;

    /// `true` if errors from this tier must fail the lookup.
    fn is_authoritative(&self) -> bool;

    /// Looks up `id`. `Ok(None)` is a miss.
    async fn get_by_id(&self, id: i64) -> Result<Option<GroupRecord>, TierError>;

    /// Writes back a record found in a slower tier.
    async fn populate(&self, record: &GroupRecord) -> Result<(), TierError>;
}

/// Fast cache tier. Best-effort in both directions.
pub struct CacheTier {
    cache: Arc<dyn GroupCache>,
}

impl CacheTier {
    pub fn new(cache: Arc<dyn GroupCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl GroupTier for CacheTier {
    fn kind(&self) -> TierKind {
        TierKind::FastCache
    }

    fn is_authoritative(&self) -> bool {
        false
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GroupRecord>, TierError> {
        Ok(self.cache.get(id).await?)
    }

    async fn populate(&self, record: &GroupRecord) -> Result<(), TierError> {
        Ok(self.cache.set(record).await?)
    }
}

/// Durable store tier. Populating it creates the row (create-on-miss).
pub struct StoreTier {
    store: Arc<dyn GroupStore>,
}

impl StoreTier {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GroupTier for StoreTier {
    fn kind(&self) -> TierKind {
        TierKind::DurableStore
    }

    fn is_authoritative(&self) -> bool {
        true
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GroupRecord>, TierError> {
        Ok(self.store.get(id).await?.map(|stored| stored.into_record()))
    }

    async fn populate(&self, record: &GroupRecord) -> Result<(), TierError> {
        match self.store.create(record, Utc::now()).await {
            Ok(_) => Ok(()),
            // A concurrent lookup confirmed the same id first.
            Err(StoreError::AlreadyExists { id }) => {
                debug!(group_id = id, "Group already stored");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Remote API tier. Never populated; every error reads as a miss.
pub struct RemoteTier {
    fetcher: Arc<dyn GroupFetcher>,
}

impl RemoteTier {
    pub fn new(fetcher: Arc<dyn GroupFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl GroupTier for RemoteTier {
    fn kind(&self) -> TierKind {
        TierKind::Remote
    }

    fn is_authoritative(&self) -> bool {
        false
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<GroupRecord>, TierError> {
        let record = self.fetcher.fetch_one(id).await?;
        if record.id != id {
            return Err(FetchError::Validation(format!(
                "requested group {} but API returned {}",
                id, record.id
            ))
            .into());
        }
        Ok(Some(record))
    }

    async fn populate(&self, _record: &GroupRecord) -> Result<(), TierError> {
        Ok(())
    }
}
