//! Tiered read path: fast cache → durable store → remote API, with write-back.

pub mod error;
pub mod lookup;
pub mod tier;


pub use error::{PipelineError, PipelineResult};
pub use lookup::{LookupPipeline, LookupResult};
pub use tier::{
    CacheTier, GroupTier, RemoteTier, SOURCE_HEADER, StoreTier, TierError, TierKind,
};
