//! Playground Verification Backend
//!
//! HTTP service behind the Self playground. The frontend saves the
//! disclosure options a user picked; the verify endpoint later checks a
//! proof against those options.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/saveOptions` - Store the verification policy for a user
//! - `POST /api/verify` - Verify a proof against the user's saved policy

pub mod config;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod proof_client;
pub mod verifier;

use axum::{
    routing::{get, post},
    Router,
};
use playground_config_store::ConfigStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use orchestrator::{Outcome, VerificationOrchestrator, VerifierFactory};
pub use proof_client::{HttpProofChecker, ProofCheck, ProofChecker};
pub use verifier::{BackendVerifier, NetworkMode, Verifier, VerifierConfig};

/// Shared application state
pub struct AppState {
    /// Policy store shared by the save-options path and the verifier
    pub store: Arc<dyn ConfigStore>,

    pub orchestrator: VerificationOrchestrator,
}

impl AppState {
    /// State wired to the production verifier
    pub fn new(config: VerifierConfig, store: Arc<dyn ConfigStore>) -> Self {
        let timeout = config.timeout;
        let verifier_store = store.clone();
        let factory: VerifierFactory =
            Box::new(move || verifier::build_verifier(config.clone(), verifier_store.clone()));

        Self::with_verifier_factory(store, factory, timeout)
    }

    /// State with a caller-supplied way of building the verifier
    pub fn with_verifier_factory(
        store: Arc<dyn ConfigStore>,
        factory: VerifierFactory,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            orchestrator: VerificationOrchestrator::new(factory, verify_timeout),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route(
            "/health",
            get(handlers::health_handler)
                .options(handlers::preflight_handler)
                .fallback(handlers::method_not_allowed_handler),
        )
        .route(
            "/api/verify",
            post(handlers::verify_handler)
                .options(handlers::preflight_handler)
                .fallback(handlers::method_not_allowed_handler),
        )
        .route(
            "/api/saveOptions",
            post(handlers::save_options_handler)
                .options(handlers::preflight_handler)
                .fallback(handlers::method_not_allowed_handler),
        )
        .fallback(handlers::root_handler)
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
