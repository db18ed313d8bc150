//! Configuration management for the playground backend
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use playground_common::{AttestationId, UserIdType};
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use crate::verifier::{NetworkMode, VerifierConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Settings handed to the verifier when it is first built
    pub verifier: VerifierConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let verifier = VerifierConfig {
            scope: env::var("SELF_SCOPE").unwrap_or_else(|_| "self-playground".to_string()),

            endpoint: env::var("VERIFY_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8080/api/verify".to_string()),

            network: env::var("VERIFIER_NETWORK")
                .unwrap_or_else(|_| "staging".to_string())
                .parse::<NetworkMode>()
                .context("Invalid VERIFIER_NETWORK")?,

            allowed_ids: parse_attestation_ids(
                &env::var("ALLOWED_ATTESTATION_IDS").unwrap_or_else(|_| "1,2,3".to_string()),
            )
            .context("Invalid ALLOWED_ATTESTATION_IDS")?,

            user_id_type: env::var("USER_ID_TYPE")
                .unwrap_or_else(|_| "uuid".to_string())
                .parse::<UserIdType>()
                .context("Invalid USER_ID_TYPE")?,

            proof_service_url: env::var("PROOF_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090/verify".to_string()),

            timeout: Duration::from_secs(
                env::var("VERIFY_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid VERIFY_TIMEOUT_SECS")?,
            ),
        };

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            verifier,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    ///
    /// Verifier settings are checked when the verifier is built, not here.
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.verifier.timeout.is_zero() {
            anyhow::bail!("VERIFY_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Parse a comma-separated attestation id list such as `1,2,3`
fn parse_attestation_ids(raw: &str) -> Result<BTreeSet<AttestationId>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse::<AttestationId>().map_err(anyhow::Error::from))
        .collect()
}
