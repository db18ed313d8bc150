//! Proof verifier used by the verify endpoint
//!
//! [`BackendVerifier`] resolves the caller's saved policy through the
//! [`ConfigStore`], delegates the cryptographic check to a [`ProofChecker`],
//! and evaluates the disclosed attributes against the policy.

use async_trait::async_trait;
use playground_common::{
    AttestationId, Error, Result, UserContext, UserIdType, ValidityDetails, VerificationConfig,
    VerificationResult,
};
use playground_config_store::ConfigStore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::proof_client::{HttpProofChecker, ProofCheck, ProofCheckRequest, ProofChecker};

/// Network the verifier accepts proofs from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Test network; mock documents are accepted
    #[default]
    Staging,
    Production,
}

impl FromStr for NetworkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" | "testnet" => Ok(NetworkMode::Staging),
            "production" | "mainnet" => Ok(NetworkMode::Production),
            other => Err(Error::InvalidVerifierConfig(format!(
                "Unknown network mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkMode::Staging => write!(f, "staging"),
            NetworkMode::Production => write!(f, "production"),
        }
    }
}

/// Settings the verifier is constructed with
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Application identifier the proofs are scoped to
    pub scope: String,

    /// Public URL of this service's verify endpoint
    pub endpoint: String,

    pub network: NetworkMode,

    /// Attestation types accepted by this deployment
    pub allowed_ids: BTreeSet<AttestationId>,

    pub user_id_type: UserIdType,

    /// Where proofs are sent for cryptographic checking
    pub proof_service_url: String,

    /// Bound on one verification, proof check included
    pub timeout: Duration,
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scope.trim().is_empty() {
            return Err(Error::InvalidVerifierConfig("scope must not be empty".into()));
        }
        check_http_url("verify endpoint", &self.endpoint)?;
        if self.allowed_ids.is_empty() {
            return Err(Error::InvalidVerifierConfig(
                "at least one attestation ID must be allowed".into(),
            ));
        }
        Ok(())
    }
}

/// Reject anything that is not an absolute http(s) URL
pub(crate) fn check_http_url(name: &str, url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::InvalidVerifierConfig(format!("invalid {} '{}': {}", name, url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::InvalidVerifierConfig(format!(
            "{} must use http or https, got {}",
            name, scheme
        ))),
    }
}

/// External proof verification as seen by the orchestrator
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        attestation_id: u32,
        proof: &serde_json::Value,
        public_signals: &serde_json::Value,
        user_context_data: &str,
    ) -> Result<VerificationResult>;
}

/// Verifier backed by the config store and a proof-check service
pub struct BackendVerifier {
    config: VerifierConfig,
    store: Arc<dyn ConfigStore>,
    proofs: Arc<dyn ProofChecker>,
}

impl BackendVerifier {
    pub fn new(
        config: VerifierConfig,
        store: Arc<dyn ConfigStore>,
        proofs: Arc<dyn ProofChecker>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            proofs,
        })
    }
}

#[async_trait]
impl Verifier for BackendVerifier {
    /// Verify a proof against the policy saved for its user
    ///
    /// The verification flow is:
    /// 1. Check the attestation type is allowed
    /// 2. Decode the user context and derive the action id
    /// 3. Load the saved policy (before the expensive proof check)
    /// 4. Check the proof
    /// 5. Evaluate the disclosures against the policy
    async fn verify(
        &self,
        attestation_id: u32,
        proof: &serde_json::Value,
        public_signals: &serde_json::Value,
        user_context_data: &str,
    ) -> Result<VerificationResult> {
        let attestation = AttestationId::try_from(attestation_id)?;
        if !self.config.allowed_ids.contains(&attestation) {
            return Err(Error::AttestationNotAllowed(attestation_id));
        }

        let context = UserContext::decode(user_context_data, self.config.user_id_type)?;

        let action_id = self
            .store
            .get_action_id(&context.user_identifier, &context.user_defined_data)
            .await?;
        let policy = self.store.get_config(&action_id).await?;
        debug!("Resolved policy for action id {}: {:?}", action_id, policy);

        let check = self
            .proofs
            .check(&ProofCheckRequest {
                attestation_id: attestation,
                proof,
                public_signals,
                scope: &self.config.scope,
                endpoint: &self.config.endpoint,
                network: self.config.network,
            })
            .await?;

        let (details, error) = evaluate(&policy, &check);

        Ok(VerificationResult {
            attestation_id: attestation,
            is_valid_details: details,
            user_identifier: context.user_identifier,
            user_defined_data: context.user_defined_data,
            discloses: check.disclosures,
            error,
        })
    }
}

/// Build the production verifier: HTTP proof checks plus policy evaluation
pub fn build_verifier(
    config: VerifierConfig,
    store: Arc<dyn ConfigStore>,
) -> Result<Arc<dyn Verifier>> {
    let proofs = HttpProofChecker::new(config.proof_service_url.clone(), config.timeout)?;
    let verifier = BackendVerifier::new(config, store, Arc::new(proofs))?;
    Ok(Arc::new(verifier))
}

/// Apply a policy to the outcome of a proof check
///
/// Returns the validity flags and the first failed check, if any.
pub fn evaluate(
    policy: &VerificationConfig,
    check: &ProofCheck,
) -> (ValidityDetails, Option<String>) {
    let disclosures = &check.disclosures;
    let mut failures = Vec::new();

    if !check.valid {
        failures.push("Proof is not valid".to_string());
    }

    let nationality_allowed = if policy.excluded_countries.is_empty() {
        true
    } else {
        match disclosures.nationality.as_deref() {
            Some(nationality) if policy.excludes(nationality) => {
                failures.push(format!("Nationality {} is excluded", nationality));
                false
            }
            Some(_) => true,
            None => {
                failures.push("Nationality was not disclosed".to_string());
                false
            }
        }
    };

    let is_minimum_age_valid = match policy.required_age() {
        None => true,
        Some(minimum) => {
            let met = disclosures.older_than.is_some_and(|age| age >= minimum);
            if !met {
                failures.push(format!("Minimum age {} not met", minimum));
            }
            met
        }
    };

    let sanctions_check_passed = !(policy.requires_sanctions_check() && disclosures.sanctions_match);
    if !sanctions_check_passed {
        failures.push("Subject matched a sanctions list".to_string());
    }

    let details = ValidityDetails {
        is_valid: check.valid && nationality_allowed,
        is_minimum_age_valid,
        sanctions_check_passed,
    };

    (details, failures.into_iter().next())
}
