//! HTTP surface of the review broker.
//!
//! Thin by design: each tool verb is one `POST /tools/<verb>` route that
//! assembles a typed input, calls the engine, and wraps the outcome in the
//! response envelope. The push channel (`GET /events`) streams server-sent
//! events to dashboard subscribers. All verb semantics live in
//! `review-engine`; nothing here opens a transaction.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::sync::Arc;

use diff_validator::DiffValidator;
use review_engine::Broker;
use review_store::Store;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::app_state::AppState;
use crate::core::config::BrokerConfig;
use crate::error_handler::AppError;

/// Boots the broker: config, store (with migrations), router, serve until
/// interrupted, then checkpoint the WAL on the way out.
pub async fn start() -> Result<(), AppError> {
    let config = BrokerConfig::from_env()?;

    if !config.project.review.enabled {
        // Orchestrators are expected to skip a disabled broker; serving
        // anyway keeps dashboards and manual inspection working.
        info!("review.enabled is false; serving for inspection only");
    }

    let store = Store::open(&config.db_path)?;
    let validator = DiffValidator::new(&config.repo_root);
    let broker = Arc::new(Broker::new(store, validator));

    let state = Arc::new(AppState {
        broker,
        config: config.clone(),
    });
    let app = routes::router(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(AppError::Bind)?;
    info!(%addr, repo_root = %config.repo_root.display(), "review broker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("shutting down; checkpointing store");
    if let Err(e) = state.broker.shutdown().await {
        warn!(error = %e, "shutdown checkpoint failed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c listener failed; shutting down");
    }
}
