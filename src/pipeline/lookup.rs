//! Ordered tier walk with write-back population.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::{PipelineError, PipelineResult};
use super::tier::{CacheTier, GroupTier, RemoteTier, StoreTier, TierKind};
use crate::cache::GroupCache;
use crate::group::GroupRecord;
use crate::remote::GroupFetcher;
use crate::store::GroupStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    Hit { record: GroupRecord, tier: TierKind },
    Miss,
}

impl LookupResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, LookupResult::Hit { .. })
    }

    /// Tier that answered, if any.
    pub fn tier(&self) -> Option<TierKind> {
        match self {
            LookupResult::Hit { tier, .. } => Some(*tier),
            LookupResult::Miss => None,
        }
    }

    pub fn record(&self) -> Option<&GroupRecord> {
        match self {
            LookupResult::Hit { record, .. } => Some(record),
            LookupResult::Miss => None,
        }
    }

    pub fn into_record(self) -> Option<GroupRecord> {
        match self {
            LookupResult::Hit { record, .. } => Some(record),
            LookupResult::Miss => None,
        }
    }

    pub fn as_header_value(&self) -> &'static str {
        self.tier().map_or("miss", |t| t.as_header_value())
    }
}

/// Walks tiers fastest-first and stops at the first hit.
///
/// On a hit at position `i`, tiers `i-1 .. 0` are populated slowest-first, so a
/// record fetched remotely reaches the durable store before the cache.
#[derive(Clone)]
pub struct LookupPipeline {
    tiers: Vec<Arc<dyn GroupTier>>,
}

impl std::fmt::Debug for LookupPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<TierKind> = self.tiers.iter().map(|t| t.kind()).collect();
        f.debug_struct("LookupPipeline")
            .field("tiers", &kinds)
            .finish()
    }
}

impl LookupPipeline {
    pub fn new(tiers: Vec<Arc<dyn GroupTier>>) -> Self {
        Self { tiers }
    }

    /// Fast cache → durable store → remote fetcher.
    pub fn standard(
        cache: Arc<dyn GroupCache>,
        store: Arc<dyn GroupStore>,
        fetcher: Arc<dyn GroupFetcher>,
    ) -> Self {
        Self::new(vec![
            Arc::new(CacheTier::new(cache)),
            Arc::new(StoreTier::new(store)),
            Arc::new(RemoteTier::new(fetcher)),
        ])
    }

    pub fn tiers(&self) -> &[Arc<dyn GroupTier>] {
        &self.tiers
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> PipelineResult<LookupResult> {
        for (index, tier) in self.tiers.iter().enumerate() {
            let kind = tier.kind();
            match tier.get_by_id(id).await {
                Ok(Some(record)) => {
                    info!(tier = %kind, "Group lookup hit");
                    self.populate(&self.tiers[..index], &record).await?;
                    return Ok(LookupResult::Hit { record, tier: kind });
                }
                Ok(None) => debug!(tier = %kind, "Group lookup miss"),
                Err(source) if tier.is_authoritative() => {
                    return Err(PipelineError::Tier { tier: kind, source });
                }
                Err(error) => warn!(tier = %kind, error = %error, "Tier read failed, falling through"),
            }
        }

        debug!("Group not found in any tier");
        Ok(LookupResult::Miss)
    }

    async fn populate(&self, faster: &[Arc<dyn GroupTier>], record: &GroupRecord) -> PipelineResult<()> {
        for tier in faster.iter().rev() {
            let kind = tier.kind();
            match tier.populate(record).await {
                Ok(()) => debug!(tier = %kind, "Populated tier"),
                Err(source) if tier.is_authoritative() => {
                    return Err(PipelineError::Tier { tier: kind, source });
                }
                Err(error) => warn!(tier = %kind, error = %error, "Tier write-back failed"),
            }
        }
        Ok(())
    }
}
