use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the excluded-country list a single policy may carry
pub const MAX_EXCLUDED_COUNTRIES: usize = 40;

/// Disclosure and verification requirements saved for one user
///
/// The config store keeps this as an opaque value; only the verifier
/// interprets the fields. Unknown keys sent by the frontend (the
/// per-field disclosure toggles) are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationConfig {
    /// Minimum age the subject must prove; `None` or `0` disables the check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_age: Option<u32>,

    /// Three-character MRZ nationality codes that are rejected
    ///
    /// These are ISO 3166-1 alpha-3 codes plus the MRZ filler forms such
    /// as `D<<` for Germany.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_countries: Vec<String>,

    /// Whether the subject must be clear of sanctions lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ofac: Option<bool>,
}

impl VerificationConfig {
    /// Check the country list against the limits the frontend enforces
    pub fn validate(&self) -> Result<()> {
        if self.excluded_countries.len() > MAX_EXCLUDED_COUNTRIES {
            return Err(Error::InvalidPolicy(format!(
                "Maximum {} countries can be excluded",
                MAX_EXCLUDED_COUNTRIES
            )));
        }

        if let Some(code) = self
            .excluded_countries
            .iter()
            .find(|code| !is_country_code(code))
        {
            return Err(Error::InvalidPolicy(format!(
                "Invalid country code: {}",
                code
            )));
        }

        Ok(())
    }

    /// Minimum age requirement, if one is active
    pub fn required_age(&self) -> Option<u32> {
        self.minimum_age.filter(|age| *age > 0)
    }

    pub fn requires_sanctions_check(&self) -> bool {
        self.ofac.unwrap_or(false)
    }

    /// Exact match, since MRZ codes are always uppercase
    pub fn excludes(&self, nationality: &str) -> bool {
        self.excluded_countries.iter().any(|code| code == nationality)
    }
}

/// Three characters from the MRZ alphabet: `A-Z` or the `<` filler
fn is_country_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase() || b == b'<')
}
