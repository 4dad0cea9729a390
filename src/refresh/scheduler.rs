use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::error::{RefreshError, RefreshResult};
use super::orchestrator::RefreshOrchestrator;

/// Fires [`RefreshOrchestrator::run`] every `every`, starting one period after
/// [`RefreshScheduler::start`].
pub struct RefreshScheduler {
    orchestrator: Arc<RefreshOrchestrator>,
    every: Duration,
    running: Arc<AtomicBool>,
    stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl RefreshScheduler {
    pub fn new(orchestrator: Arc<RefreshOrchestrator>, every: Duration) -> Self {
        Self {
            orchestrator,
            every,
            running: Arc::new(AtomicBool::new(false)),
            stop: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts the timer task (no-op if already running).
    ///
    /// Fails with [`RefreshError::InvalidInterval`] if the period is zero or the
    /// first deadline is not representable.
    pub fn start(&self) -> RefreshResult<JoinHandle<()>> {
        if self.every.is_zero() {
            return Err(RefreshError::InvalidInterval(self.every));
        }
        let first = Instant::now()
            .checked_add(self.every)
            .ok_or(RefreshError::InvalidInterval(self.every))?;

        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(tokio::spawn(async {}));
        }

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        *self.stop.lock() = Some(stop_tx);

        let orchestrator = Arc::clone(&self.orchestrator);
        let running = Arc::clone(&self.running);
        let every = self.every;

        Ok(tokio::spawn(async move {
            let mut interval = time::interval_at(first, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match orchestrator.run().await {
                            Ok(summary) => info!(%summary, "Scheduled refresh dispatched"),
                            Err(e) => error!(error = %e, "Scheduled refresh failed"),
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }

            running.store(false, Ordering::Release);
        }))
    }

    /// Signals the running timer task to exit after its current run. Does
    /// nothing if the scheduler was never started.
    pub fn stop(&self) {
        if let Some(stop) = self.stop.lock().take() {
            let _ = stop.send(());
        }
    }
}
