//! Escheat Server - Main entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use escheat_common::logging::{init_logging, LogConfig};
use escheat_server::api::{router, AppState};
use escheat_server::config::Config;
use escheat_server::db;
use escheat_server::ingest::{BatchLoader, SourceFetcher, SyncOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::from_env(
        "info,escheat_server=debug,tower_http=debug,sqlx=warn",
        "escheat-server",
    );
    init_logging(&log_config)?;

    info!("Starting escheat server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    // Mirror the original toolkit: optionally build the database before
    // serving when the store is still empty.
    if config.ingest.sync_on_start && db::search::store_row_count(&pool).await? == 0 {
        info!("Store is empty and SYNC_ON_START is set, running ingestion");
        let fetcher = SourceFetcher::new(&config.source)?;
        let loader = BatchLoader::new(pool.clone());
        let orchestrator = SyncOrchestrator::new(fetcher, loader, config.ingest.chunk_size);
        let summary = orchestrator.run(&config.source.archives).await?;
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "Initial ingestion complete"
        );
    }

    let state = AppState::new(pool, Arc::new(config.clone()));
    let app = router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
