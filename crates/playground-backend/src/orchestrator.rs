//! Verification orchestration
//!
//! Drives one verify request through the verifier and classifies the
//! result into exactly one [`Outcome`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use playground_common::{Error, Result, VerificationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::models::{VerifyRequest, VerifyResponse};
use crate::verifier::Verifier;

const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Builds the verifier the first time a verify request needs it
pub type VerifierFactory = Box<dyn Fn() -> Result<Arc<dyn Verifier>> + Send + Sync>;

/// Classified result of a verify request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The proof checked out but the subject is below the minimum age
    MinimumAgeFailed,
    /// The proof checked out but the subject failed the sanctions check
    SanctionsFailed,
    /// The verifier returned a result that is not valid
    VerificationFailed,
    MalformedRequest,
    /// No policy was saved for the derived action id
    PolicyMissing { action_id: String },
    InternalError { reason: String },
}

impl Outcome {
    /// Map a verifier result to an outcome
    ///
    /// Rules apply in a fixed order and the first match wins: errors,
    /// overall validity, minimum age, then sanctions.
    pub fn classify(result: Result<VerificationResult>) -> Self {
        let result = match result {
            Ok(result) => result,
            Err(Error::PolicyNotFound(action_id)) => return Outcome::PolicyMissing { action_id },
            Err(e) => {
                return Outcome::InternalError {
                    reason: e.to_string(),
                }
            }
        };

        let details = result.is_valid_details;
        if !details.is_valid {
            Outcome::VerificationFailed
        } else if !details.is_minimum_age_valid {
            Outcome::MinimumAgeFailed
        } else if !details.sanctions_check_passed {
            Outcome::SanctionsFailed
        } else {
            Outcome::Success
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Outcome::Success
            | Outcome::MinimumAgeFailed
            | Outcome::SanctionsFailed
            | Outcome::VerificationFailed => StatusCode::OK,
            Outcome::MalformedRequest => StatusCode::BAD_REQUEST,
            Outcome::PolicyMissing { .. } | Outcome::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Outcome::Success => VerifyResponse::success(),
            Outcome::MinimumAgeFailed => VerifyResponse::error("Minimum age check failed"),
            Outcome::SanctionsFailed => VerifyResponse::error("OFAC check failed"),
            Outcome::VerificationFailed => VerifyResponse::error("Verification failed"),
            Outcome::MalformedRequest => {
                return (
                    status,
                    Json(serde_json::json!({ "message": "Invalid JSON" })),
                )
                    .into_response()
            }
            Outcome::PolicyMissing { action_id } => {
                VerifyResponse::error(Error::PolicyNotFound(action_id).to_string())
            }
            Outcome::InternalError { reason } => VerifyResponse::error(reason),
        };

        (status, Json(body)).into_response()
    }
}

/// Owns the lazily built verifier and runs verify requests through it
pub struct VerificationOrchestrator {
    verifier: OnceCell<Arc<dyn Verifier>>,
    factory: VerifierFactory,
    timeout: Duration,
}

impl VerificationOrchestrator {
    pub fn new(factory: VerifierFactory, timeout: Duration) -> Self {
        Self {
            verifier: OnceCell::new(),
            factory,
            timeout,
        }
    }

    /// Handle one verify request body
    ///
    /// A failed construction is not cached; the next request tries again.
    pub async fn handle_verify(&self, body: &[u8]) -> Outcome {
        let request = match VerifyRequest::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejecting verify request: {}", e);
                return Outcome::MalformedRequest;
            }
        };

        let verifier = match self.verifier().await {
            Ok(verifier) => verifier,
            Err(e) => {
                error!("Failed to initialize verifier: {}", e);
                return Outcome::InternalError {
                    reason: INTERNAL_SERVER_ERROR.to_string(),
                };
            }
        };

        let call = verifier.verify(
            request.attestation_id,
            &request.proof,
            &request.public_signals,
            &request.user_context_data,
        );
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        };

        if let Ok(result) = &result {
            if let Some(reason) = &result.error {
                info!(
                    "Verification for {} rejected: {}",
                    result.user_identifier, reason
                );
            }
        }

        let outcome = Outcome::classify(result);
        match &outcome {
            Outcome::Success => info!("Verification succeeded"),
            Outcome::PolicyMissing { action_id } => {
                error!("No policy saved for action id: {}", action_id)
            }
            Outcome::InternalError { reason } => error!("Verification errored: {}", reason),
            other => warn!("Verification did not pass: {:?}", other),
        }
        outcome
    }

    async fn verifier(&self) -> Result<Arc<dyn Verifier>> {
        self.verifier
            .get_or_try_init(|| async { (self.factory)() })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playground_common::{AttestationId, Disclosures, ValidityDetails};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result_with(is_valid: bool, age: bool, sanctions: bool) -> VerificationResult {
        VerificationResult {
            attestation_id: AttestationId::Passport,
            is_valid_details: ValidityDetails {
                is_valid,
                is_minimum_age_valid: age,
                sanctions_check_passed: sanctions,
            },
            user_identifier: "u1".to_string(),
            user_defined_data: String::new(),
            discloses: Disclosures::default(),
            error: None,
        }
    }

    struct FixedVerifier(fn() -> Result<VerificationResult>);

    #[async_trait]
    impl Verifier for FixedVerifier {
        async fn verify(
            &self,
            _attestation_id: u32,
            _proof: &serde_json::Value,
            _public_signals: &serde_json::Value,
            _user_context_data: &str,
        ) -> Result<VerificationResult> {
            (self.0)()
        }
    }

    struct SlowVerifier;

    #[async_trait]
    impl Verifier for SlowVerifier {
        async fn verify(
            &self,
            _attestation_id: u32,
            _proof: &serde_json::Value,
            _public_signals: &serde_json::Value,
            _user_context_data: &str,
        ) -> Result<VerificationResult> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(result_with(true, true, true))
        }
    }

    fn valid_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "attestationId": 1,
            "proof": { "a": [] },
            "publicSignals": [],
            "userContextData": "00"
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_priority_order() {
        assert_eq!(
            Outcome::classify(Ok(result_with(true, true, true))),
            Outcome::Success
        );
        // Every flag false: overall validity wins
        assert_eq!(
            Outcome::classify(Ok(result_with(false, false, false))),
            Outcome::VerificationFailed
        );
        // Age and sanctions both false: age wins
        assert_eq!(
            Outcome::classify(Ok(result_with(true, false, false))),
            Outcome::MinimumAgeFailed
        );
        assert_eq!(
            Outcome::classify(Ok(result_with(true, true, false))),
            Outcome::SanctionsFailed
        );
    }

    #[test]
    fn test_classify_errors() {
        assert_eq!(
            Outcome::classify(Err(Error::PolicyNotFound("u1".to_string()))),
            Outcome::PolicyMissing {
                action_id: "u1".to_string()
            }
        );
        assert_eq!(
            Outcome::classify(Err(Error::ProofService("down".to_string()))),
            Outcome::InternalError {
                reason: "Proof service error: down".to_string()
            }
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Outcome::MinimumAgeFailed.status_code(), StatusCode::OK);
        assert_eq!(Outcome::SanctionsFailed.status_code(), StatusCode::OK);
        assert_eq!(Outcome::MalformedRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Outcome::PolicyMissing {
                action_id: "u1".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_verifier_built_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let factory: VerifierFactory = Box::new(move || -> Result<Arc<dyn Verifier>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FixedVerifier(|| Ok(result_with(true, true, true)))))
        });
        let orchestrator = VerificationOrchestrator::new(factory, Duration::from_secs(5));

        for _ in 0..3 {
            assert_eq!(orchestrator.handle_verify(&valid_body()).await, Outcome::Success);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_construction_failure_is_internal_error() {
        let factory: VerifierFactory = Box::new(|| -> Result<Arc<dyn Verifier>> {
            Err(Error::InvalidVerifierConfig("scope must not be empty".into()))
        });
        let orchestrator = VerificationOrchestrator::new(factory, Duration::from_secs(5));

        assert_eq!(
            orchestrator.handle_verify(&valid_body()).await,
            Outcome::InternalError {
                reason: "Internal server error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_skips_verifier() {
        let factory: VerifierFactory = Box::new(|| -> Result<Arc<dyn Verifier>> {
            panic!("verifier must not be built")
        });
        let orchestrator = VerificationOrchestrator::new(factory, Duration::from_secs(5));

        assert_eq!(
            orchestrator.handle_verify(b"{\"attestationId\":").await,
            Outcome::MalformedRequest
        );
    }

    #[tokio::test]
    async fn test_verify_timeout() {
        let factory: VerifierFactory =
            Box::new(|| -> Result<Arc<dyn Verifier>> { Ok(Arc::new(SlowVerifier)) });
        let orchestrator = VerificationOrchestrator::new(factory, Duration::from_millis(50));

        let outcome = orchestrator.handle_verify(&valid_body()).await;
        assert_eq!(
            outcome,
            Outcome::InternalError {
                reason: "Verification timed out after 50ms".to_string()
            }
        );
    }
}
