//! Verification Policy Store
//!
//! Maps a user identifier to the verification policy saved for it.
//! The verifier resolves policies through [`ConfigStore`] while checking a
//! proof; the save-options endpoint writes them.

pub mod memory;

use async_trait::async_trait;
use playground_common::{Result, VerificationConfig};
use std::sync::Arc;

pub use memory::InMemoryConfigStore;

/// Derives the lookup key for a policy from the verified user context
///
/// Callers must not assume the action id equals the user identifier.
pub type ActionIdResolver = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// The default derivation: the action id is the user identifier itself
pub fn identity_action_id(user_identifier: &str, _user_defined_data: &str) -> String {
    user_identifier.to_string()
}

/// Storage backend for verification policies
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Derive the action id used to look up a policy
    async fn get_action_id(&self, user_identifier: &str, user_defined_data: &str)
        -> Result<String>;

    /// Insert or overwrite the policy stored under `id`
    async fn set_config(&self, id: &str, config: VerificationConfig) -> Result<bool>;

    /// Fetch the policy stored under `id`
    ///
    /// # Returns
    /// * `Ok(config)` - The last policy written for `id`
    /// * `Err(Error::PolicyNotFound)` - Nothing was ever saved for `id`
    async fn get_config(&self, id: &str) -> Result<VerificationConfig>;

    /// Release backend resources
    async fn close(&self) -> Result<()>;
}
