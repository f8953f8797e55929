pub mod api;
pub mod config;
pub mod core;
pub mod logging;
pub mod service;
pub mod snapshot;

use std::sync::Arc;
use tracing::{error, info};

use crate::api::AppState;
use crate::config::Config;
use crate::core::registry::QueueRegistry;
use crate::service::QueueService;
use crate::snapshot::SnapshotEngine;

/// Wires the registry, snapshot engine, facade and HTTP server together and
/// serves until SIGINT/SIGTERM, then runs one final snapshot.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(QueueRegistry::new());
    let engine = Arc::new(SnapshotEngine::new());

    engine.load(&registry);
    let snapshot_task = snapshot::spawn_periodic(Arc::clone(&engine), Arc::clone(&registry));

    let state = AppState {
        service: Arc::new(QueueService::new(Arc::clone(&registry))),
    };

    api::rest::start_server(state, &config.server.bind_addr, shutdown_signal()).await?;

    info!("shutdown detected, saving final snapshot");
    snapshot_task.abort();
    if let Err(e) = engine.save(&registry) {
        error!(error = %e, "final snapshot save failed");
    }

    Ok(())
}

/// Resolves when the process receives SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("received SIGTERM");
        }
    }
}
