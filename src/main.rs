//! Strata HTTP server entrypoint.
//!
//! `strata` serves lookups and runs the refresh scheduler. `strata refresh`
//! runs one refresh pass, waits for every batch and prints the summary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use strata::cache::{GroupCache, LocalGroupCache, RedisGroupCache};
use strata::config::Config;
use strata::gateway::{AppState, create_router};
use strata::pipeline::LookupPipeline;
use strata::refresh::{BatchRefresher, RefreshOrchestrator, RefreshQueue, RefreshScheduler};
use strata::remote::{VkClient, VkClientConfig};
use strata::store::FileGroupStore;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }
    let refresh_once = std::env::args().nth(1).is_some_and(|arg| arg == "refresh");

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let store = Arc::new(FileGroupStore::new(config.storage_path.clone()));
    store.ensure_storage_path()?;
    let client = Arc::new(VkClient::new(VkClientConfig::from(&config))?);

    let refresher = BatchRefresher::new(client.clone(), store.clone());
    let queue = Arc::new(RefreshQueue::start(refresher, config.refresh_workers));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        store.clone(),
        queue.clone(),
        config.staleness,
        config.max_batch_size,
    )?);

    if refresh_once {
        let summary = orchestrator.run().await;
        let stats = queue.shutdown().await;
        let summary = summary?;
        tracing::info!(
            completed = stats.batches_completed,
            failed = stats.batches_failed,
            updated = stats.groups_updated,
            "Refresh finished"
        );
        println!("{}", summary);
        return Ok(());
    }

    let addr: SocketAddr = config.socket_addr().parse()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        storage_path = %config.storage_path.display(),
        "Strata starting"
    );

    let cache = build_cache(&config).await;
    let pipeline = Arc::new(LookupPipeline::standard(cache, store, client));

    let scheduler = Arc::new(RefreshScheduler::new(
        orchestrator.clone(),
        config.refresh_every,
    ));
    let scheduler_task = scheduler.start()?;

    let app = create_router(AppState::new(pipeline, orchestrator));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    if let Err(e) = scheduler_task.await {
        tracing::error!(error = %e, "Refresh scheduler panicked");
    }
    queue.shutdown().await;

    tracing::info!("Strata shutdown complete");
    Ok(())
}

async fn build_cache(config: &Config) -> Arc<dyn GroupCache> {
    if let Some(url) = config.cache_url.as_deref() {
        match RedisGroupCache::connect(url).await {
            Ok(cache) => {
                tracing::info!("Using Redis fast cache");
                return Arc::new(cache);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis cache unavailable, using in-process cache");
            }
        }
    }
    Arc::new(LocalGroupCache::with_capacity(config.cache_capacity))
}

async fn run_health_check() -> i32 {
    let port = std::env::var("STRATA_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(client) = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
    else {
        return 1;
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        _ => 1,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
