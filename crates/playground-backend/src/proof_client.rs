//! Client for the proof-check service

use async_trait::async_trait;
use playground_common::{AttestationId, Disclosures, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::verifier::{check_http_url, NetworkMode};

/// Body sent to the proof-check service
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofCheckRequest<'a> {
    pub attestation_id: AttestationId,
    pub proof: &'a serde_json::Value,
    pub public_signals: &'a serde_json::Value,
    pub scope: &'a str,
    pub endpoint: &'a str,
    pub network: NetworkMode,
}

/// Answer from the proof-check service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofCheck {
    /// Whether the proof verified against its public signals and scope
    pub valid: bool,

    #[serde(default)]
    pub disclosures: Disclosures,
}

/// Cryptographic proof checking
#[async_trait]
pub trait ProofChecker: Send + Sync {
    async fn check(&self, request: &ProofCheckRequest<'_>) -> Result<ProofCheck>;
}

/// Proof checker that posts to a remote service
pub struct HttpProofChecker {
    url: String,
    client: reqwest::Client,
}

impl HttpProofChecker {
    /// Create a new proof-check client
    ///
    /// # Arguments
    /// * `url` - Endpoint that accepts [`ProofCheckRequest`] bodies
    /// * `timeout` - Per-request timeout
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        check_http_url("proof service URL", &url)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::InvalidVerifierConfig(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { url, client })
    }
}

#[async_trait]
impl ProofChecker for HttpProofChecker {
    async fn check(&self, request: &ProofCheckRequest<'_>) -> Result<ProofCheck> {
        debug!(
            "Sending {} proof to {}",
            request.attestation_id, self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::ProofService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ProofService(format!(
                "proof service returned {}",
                response.status()
            )));
        }

        response
            .json::<ProofCheck>()
            .await
            .map_err(|e| Error::ProofService(format!("invalid proof service response: {}", e)))
    }
}
