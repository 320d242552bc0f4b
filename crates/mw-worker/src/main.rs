//! Media worker binary.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use mw_queue::{JobSource, QueueConfig, RedisJobQueue, RedisStatusSink, ResultSink};
use mw_storage::{ArtifactStore, LocalStore, S3Client};
use mw_worker::{init_tracing, metrics, LoopSettings, PipelineCoordinator, WorkerConfig, WorkerLoop};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing("mw_worker=info,mw_media=info,mw_storage=info,mw_queue=info");

    // Needed for rediss:// and https:// endpoints.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting media-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    match metrics::install_from_env() {
        Ok(Some(port)) => info!("Serving metrics on port {}", port),
        Ok(None) => {}
        Err(e) => exit_with("Failed to start metrics exporter", e),
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.work_dir).await {
        exit_with(
            &format!("Failed to create work dir {}", config.work_dir.display()),
            e,
        );
    }

    let store = init_store().await;

    let queue_config = QueueConfig::from_env();
    let source: Arc<dyn JobSource> = match RedisJobQueue::connect(&queue_config).await {
        Ok(q) => Arc::new(q),
        Err(e) => exit_with("Failed to connect to job queue", e),
    };
    let sink: Arc<dyn ResultSink> = match RedisStatusSink::connect(&queue_config).await {
        Ok(s) => Arc::new(s),
        Err(e) => exit_with("Failed to connect to status store", e),
    };

    let coordinator = Arc::new(PipelineCoordinator::from_config(&config, store, sink));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal, finishing current job");
        let _ = shutdown_tx.send(true);
    });

    let mut worker = WorkerLoop::new(source, coordinator, LoopSettings::from(&config), shutdown_rx);
    worker.run().await;

    info!("Worker shutdown complete");
}

/// `STORAGE_BACKEND=local` selects the filesystem store; anything else
/// uses the S3-compatible client and makes sure the bucket exists.
async fn init_store() -> Arc<dyn ArtifactStore> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_default();
    if backend.eq_ignore_ascii_case("local") {
        let store = LocalStore::from_env();
        info!("Using local artifact store: {:?}", store);
        return Arc::new(store);
    }

    let client = match S3Client::from_env() {
        Ok(c) => c,
        Err(e) => exit_with("Failed to configure object store", e),
    };
    if let Err(e) = client.ensure_bucket().await {
        exit_with("Failed to prepare bucket", e);
    }
    info!("Using object store bucket {}", client.bucket());
    Arc::new(client)
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("Cannot listen for SIGTERM: {}", e);
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}

fn exit_with(context: &str, err: impl Display) -> ! {
    error!("{}: {}", context, err);
    std::process::exit(1);
}
