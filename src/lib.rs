//! Strata library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Lookup
//! - [`LookupPipeline`], [`LookupResult`] - ordered tier chain with write-back
//! - [`GroupTier`], [`CacheTier`], [`StoreTier`], [`RemoteTier`] - tier adapters
//!
//! ## Tiers
//! - [`GroupCache`], [`LocalGroupCache`], [`RedisGroupCache`] - fast cache
//! - [`GroupStore`], [`FileGroupStore`], [`MemoryGroupStore`] - durable store
//! - [`GroupFetcher`], [`VkClient`] - VK `groups.getById` client
//!
//! ## Refresh
//! - [`RefreshOrchestrator`], [`RefreshSummary`] - staleness scan and batching
//! - [`RefreshQueue`], [`BatchRefresher`] - batch execution
//! - [`RefreshScheduler`] - periodic trigger
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod gateway;
pub mod group;
pub mod pipeline;
pub mod refresh;
pub mod remote;
pub mod store;

pub use cache::{
    CacheError, CacheResult, DEFAULT_CACHE_CAPACITY, GroupCache, LocalGroupCache, RedisGroupCache,
};
pub use config::{Config, ConfigError};
pub use gateway::{AppState, GatewayError, create_router};
pub use group::{GroupRecord, StoredGroup};
pub use pipeline::{
    CacheTier, GroupTier, LookupPipeline, LookupResult, PipelineError, PipelineResult,
    RemoteTier, SOURCE_HEADER, StoreTier, TierError, TierKind,
};
pub use refresh::{
    BatchDispatcher, BatchRefresher, RefreshError, RefreshOrchestrator, RefreshQueue,
    RefreshResult, RefreshScheduler, RefreshStats, RefreshStatsSnapshot, RefreshSummary,
};
#[cfg(any(test, feature = "mock"))]
pub use remote::MockGroupFetcher;
pub use remote::{
    DEFAULT_API_URL, DEFAULT_API_VERSION, FetchError, FetchResult, GroupFetcher, VkClient,
    VkClientConfig,
};
pub use store::{FileGroupStore, GroupStore, MemoryGroupStore, StoreError, StoreResult};
