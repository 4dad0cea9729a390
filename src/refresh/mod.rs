//! Staleness-driven batch refresh.
//!
//! The [`RefreshOrchestrator`] finds stale durable rows and hands fixed-size
//! batches to a [`BatchDispatcher`]. The [`RefreshQueue`] dispatcher runs each
//! batch through a [`BatchRefresher`] on a small worker pool, and the
//! [`RefreshScheduler`] fires the orchestrator on a fixed interval.

pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod scheduler;
pub mod worker;


pub use error::{RefreshError, RefreshResult};
pub use orchestrator::{BatchDispatcher, RefreshOrchestrator, RefreshSummary};
pub use queue::{RefreshQueue, RefreshStats, RefreshStatsSnapshot};
pub use scheduler::RefreshScheduler;
pub use worker::BatchRefresher;
