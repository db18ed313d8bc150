use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration not found for user: {0}")]
    PolicyNotFound(String),

    #[error("Attestation ID {0} is not allowed")]
    AttestationNotAllowed(u32),

    #[error("Invalid user context data: {0}")]
    InvalidUserContext(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid verifier configuration: {0}")]
    InvalidVerifierConfig(String),

    #[error("Proof service error: {0}")]
    ProofService(String),

    #[error("Verification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, Error>;
