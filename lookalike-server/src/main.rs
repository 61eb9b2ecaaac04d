//! Lookalike Server - REST API for duplicate image detection
//!
//! Exposes lookalike-core functionality via HTTP endpoints:
//! - POST /submit - Classify an image fingerprint and record it when new
//! - GET /health - Health check with index size
//! - GET /ready - Readiness probe

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use lookalike_core::{DuplicateDetector, MemoryRecordStore, RecordStore};
use lookalike_server::{create_router_with_config, AppState, Config, PostgresRecordStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let detector_config = config.detector_config();

    if let Err(e) = detector_config.validate() {
        tracing::error!(error = %e, "Invalid detector configuration");
        return ExitCode::FAILURE;
    }

    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => match PostgresRecordStore::connect(url, config.database_max_connections).await
        {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to record store");
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory record store (nothing persists)");
            Arc::new(MemoryRecordStore::new())
        }
    };

    // The index must be complete before the first request is served
    let detector = match DuplicateDetector::bootstrap(store, detector_config).await {
        Ok((detector, report)) => {
            tracing::info!(
                scanned = report.scanned,
                indexed = report.indexed,
                skipped = report.skipped,
                "Detector ready"
            );
            detector
        }
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            return ExitCode::FAILURE;
        }
    };

    if let Ok(params) = detector.config().banding() {
        tracing::info!(
            bands = params.bands,
            rows = params.rows,
            threshold_point = params.threshold_point(),
            "Candidate index banding"
        );
    }

    let app = create_router_with_config(AppState::new(detector), &config);
    let addr = config.socket_addr();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "Lookalike server listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
