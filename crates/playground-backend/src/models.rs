//! Request and response bodies

use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Serialize};

/// Body of `POST /api/verify`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub attestation_id: u32,

    /// Groth16 proof, passed through to the verifier untouched
    pub proof: serde_json::Value,

    pub public_signals: serde_json::Value,

    /// Hex-encoded chain id, user identifier and user-defined data
    pub user_context_data: String,
}

impl VerifyRequest {
    /// Parse a request body, rejecting proofs and signals that are not JSON containers
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let request: Self = serde_json::from_slice(body)?;

        if !request.proof.is_object() {
            return Err(serde_json::Error::custom("proof must be a JSON object"));
        }
        if !(request.public_signals.is_object() || request.public_signals.is_array()) {
            return Err(serde_json::Error::custom(
                "publicSignals must be a JSON object or array",
            ));
        }

        Ok(request)
    }
}

/// Body returned by `POST /api/verify`
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerifyResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            result: true,
            reason: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: "error",
            result: false,
            reason: Some(reason.into()),
        }
    }
}

/// Body of `POST /api/saveOptions`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptionsRequest {
    #[serde(default)]
    pub user_id: String,

    /// Frontend disclosure options; parsed into a policy by the handler
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SaveOptionsResponse {
    pub message: String,
}

/// Body returned by `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
