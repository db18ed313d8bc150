//! API request handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use playground_common::VerificationConfig;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{HealthResponse, SaveOptionsRequest, SaveOptionsResponse},
    orchestrator::Outcome,
    AppState,
};

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "message": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<playground_common::Error> for ApiError {
    fn from(err: playground_common::Error) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Backend server is running".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Verify a proof against the policy saved for its user
pub async fn verify_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Outcome {
    state.orchestrator.handle_verify(&body).await
}

/// Save the verification options chosen for a user
pub async fn save_options_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SaveOptionsResponse>, ApiError> {
    let payload: SaveOptionsRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejecting save options request: {}", e);
        ApiError::bad_request("Invalid JSON")
    })?;

    if payload.user_id.is_empty() {
        return Err(ApiError::bad_request("User ID is required"));
    }

    let options = payload
        .options
        .ok_or_else(|| ApiError::bad_request("Options are required"))?;

    let config: VerificationConfig = serde_json::from_value(options).map_err(|e| {
        ApiError::bad_request(format!("Options do not match expected structure: {}", e))
    })?;
    config
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    state
        .store
        .set_config(&payload.user_id, config.clone())
        .await
        .map_err(|e| {
            error!("Failed to save options for {}: {}", payload.user_id, e);
            ApiError::from(e)
        })?;

    info!("Saved options for user: {}, options: {:?}", payload.user_id, config);

    Ok(Json(SaveOptionsResponse {
        message: "Options saved successfully".to_string(),
    }))
}

/// Bare OPTIONS on a known route
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Any other method on a known route
pub async fn method_not_allowed_handler() -> ApiError {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "Method not allowed".to_string(),
    }
}

/// Catch-all listing the available endpoints
pub async fn root_handler(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    (
        StatusCode::OK,
        "Playground backend is running!\nAvailable endpoints:\n- GET /health\n- POST /api/verify\n- POST /api/saveOptions",
    )
        .into_response()
}
