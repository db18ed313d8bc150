//! Playground Verification Backend
//!
//! REST API for saving per-user verification policies and verifying proofs against them

use anyhow::{Context, Result};
use playground_backend::{config::Config, create_router, AppState};
use playground_config_store::{ConfigStore, InMemoryConfigStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playground_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Playground Backend");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Verifier scope: {}", config.verifier.scope);
    info!("Verify endpoint: {}", config.verifier.endpoint);
    info!("Network: {}", config.verifier.network);
    info!("Proof service: {}", config.verifier.proof_service_url);

    // Policies live for the lifetime of the process
    let store: Arc<dyn ConfigStore> = Arc::new(InMemoryConfigStore::new());

    // Create router
    let state = AppState::new(config.verifier.clone(), store.clone());
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Playground backend listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());
    info!("API endpoints:");
    info!("  POST /api/verify - Verify a proof");
    info!("  POST /api/saveOptions - Save verification options");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await.context("Failed to close config store")?;
    info!("Playground backend stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
