use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity document families a proof can attest to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum AttestationId {
    Passport,
    EuIdCard,
    Aadhaar,
}

impl AttestationId {
    pub fn as_u32(self) -> u32 {
        match self {
            AttestationId::Passport => 1,
            AttestationId::EuIdCard => 2,
            AttestationId::Aadhaar => 3,
        }
    }
}

impl From<AttestationId> for u32 {
    fn from(id: AttestationId) -> Self {
        id.as_u32()
    }
}

impl TryFrom<u32> for AttestationId {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(AttestationId::Passport),
            2 => Ok(AttestationId::EuIdCard),
            3 => Ok(AttestationId::Aadhaar),
            other => Err(Error::AttestationNotAllowed(other)),
        }
    }
}

impl FromStr for AttestationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u32 = s.trim().parse().map_err(|_| {
            Error::InvalidVerifierConfig(format!("Invalid attestation ID: {}", s))
        })?;
        AttestationId::try_from(value)
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttestationId::Passport => "passport",
            AttestationId::EuIdCard => "eu-id-card",
            AttestationId::Aadhaar => "aadhaar",
        };
        write!(f, "{} ({})", name, self.as_u32())
    }
}

/// How the user identifier embedded in the context data is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserIdType {
    #[default]
    Uuid,
    Hex,
}

impl FromStr for UserIdType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(UserIdType::Uuid),
            "hex" => Ok(UserIdType::Hex),
            other => Err(Error::InvalidVerifierConfig(format!(
                "Unknown user ID type: {}",
                other
            ))),
        }
    }
}

const CHAIN_ID_BYTES: usize = 32;
const USER_ID_BYTES: usize = 32;

/// Decoded `userContextData` sent alongside a proof
///
/// Layout (hex, optional `0x` prefix): 32 bytes destination chain id,
/// 32 bytes user identifier, then free-form user-defined data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// User identifier rendered per [`UserIdType`]
    pub user_identifier: String,

    /// Hex encoding of the trailing user-defined bytes
    pub user_defined_data: String,
}

impl UserContext {
    pub fn decode(user_context_data: &str, id_type: UserIdType) -> Result<Self> {
        let raw = user_context_data
            .strip_prefix("0x")
            .unwrap_or(user_context_data);
        let bytes = hex::decode(raw)?;

        if bytes.len() < CHAIN_ID_BYTES + USER_ID_BYTES {
            return Err(Error::InvalidUserContext(format!(
                "expected at least {} bytes, got {}",
                CHAIN_ID_BYTES + USER_ID_BYTES,
                bytes.len()
            )));
        }

        let id_bytes = &bytes[CHAIN_ID_BYTES..CHAIN_ID_BYTES + USER_ID_BYTES];
        let user_identifier = match id_type {
            UserIdType::Uuid => Uuid::from_slice(&id_bytes[USER_ID_BYTES - 16..])
                .map_err(|e| Error::InvalidUserContext(e.to_string()))?
                .to_string(),
            UserIdType::Hex => format!("0x{}", hex::encode(&id_bytes[USER_ID_BYTES - 20..])),
        };

        Ok(Self {
            user_identifier,
            user_defined_data: hex::encode(&bytes[CHAIN_ID_BYTES + USER_ID_BYTES..]),
        })
    }
}

/// Attributes the proof disclosed about the subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disclosures {
    /// Age threshold the subject proved to be at or above
    #[serde(default)]
    pub older_than: Option<u32>,

    /// Alpha-3 nationality code
    #[serde(default)]
    pub nationality: Option<String>,

    /// true = the subject matched an entry on a sanctions list
    #[serde(default)]
    pub sanctions_match: bool,
}

/// Validity flags of one verification
///
/// `sanctions_check_passed` is true when the subject is clear of sanctions
/// lists (or the policy did not ask for the check).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityDetails {
    pub is_valid: bool,
    pub is_minimum_age_valid: bool,
    pub sanctions_check_passed: bool,
}

/// Result of a single verifier call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub attestation_id: AttestationId,
    pub is_valid_details: ValidityDetails,
    pub user_identifier: String,
    pub user_defined_data: String,
    pub discloses: Disclosures,

    /// First failing check, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
