//! Types shared by the policy store and the verification backend

pub mod error;
pub mod policy;
pub mod verification;

pub use error::{Error, Result};
pub use policy::{VerificationConfig, MAX_EXCLUDED_COUNTRIES};
pub use verification::{
    AttestationId, Disclosures, UserContext, UserIdType, ValidityDetails, VerificationResult,
};
