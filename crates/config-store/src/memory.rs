//! In-memory policy storage

use crate::{identity_action_id, ActionIdResolver, ConfigStore};
use async_trait::async_trait;
use playground_common::{Error, Result, VerificationConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Process-lifetime policy store
///
/// Readers share the lock; a write excludes everyone for the duration of a
/// single map insert. Entries are never evicted.
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<String, VerificationConfig>>,
    resolve_action_id: ActionIdResolver,
}

impl InMemoryConfigStore {
    /// Create a store whose action id is the user identifier
    pub fn new() -> Self {
        Self::with_action_id_resolver(Arc::new(identity_action_id))
    }

    /// Create a store with a custom action id derivation
    pub fn with_action_id_resolver(resolve_action_id: ActionIdResolver) -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
            resolve_action_id,
        }
    }
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_action_id(
        &self,
        user_identifier: &str,
        user_defined_data: &str,
    ) -> Result<String> {
        Ok((self.resolve_action_id)(user_identifier, user_defined_data))
    }

    async fn set_config(&self, id: &str, config: VerificationConfig) -> Result<bool> {
        let mut configs = self.configs.write().await;
        configs.insert(id.to_string(), config);
        drop(configs);

        debug!("Stored policy for: {}", id);
        Ok(true)
    }

    async fn get_config(&self, id: &str) -> Result<VerificationConfig> {
        let configs = self.configs.read().await;
        configs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PolicyNotFound(id.to_string()))
    }

    async fn close(&self) -> Result<()> {
        info!("Closing in-memory config store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(minimum_age: u32) -> VerificationConfig {
        VerificationConfig {
            minimum_age: Some(minimum_age),
            excluded_countries: vec!["PRK".to_string()],
            ofac: Some(true),
        }
    }

    #[tokio::test]
    async fn test_set_and_get_config() {
        let store = InMemoryConfigStore::new();

        let saved = store.set_config("user-1", policy(18)).await.unwrap();
        assert!(saved);

        let retrieved = store.get_config("user-1").await.unwrap();
        assert_eq!(retrieved, policy(18));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = InMemoryConfigStore::new();

        store.set_config("user-1", policy(18)).await.unwrap();
        store.set_config("user-1", policy(21)).await.unwrap();

        let retrieved = store.get_config("user-1").await.unwrap();
        assert_eq!(retrieved.minimum_age, Some(21));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = InMemoryConfigStore::new();

        store.set_config("user-1", policy(18)).await.unwrap();
        store
            .set_config("user-2", VerificationConfig::default())
            .await
            .unwrap();

        assert_eq!(store.get_config("user-1").await.unwrap(), policy(18));
        assert_eq!(
            store.get_config("user-2").await.unwrap(),
            VerificationConfig::default()
        );
    }

    #[tokio::test]
    async fn test_missing_config_is_an_error() {
        let store = InMemoryConfigStore::new();
        store.set_config("user-1", policy(18)).await.unwrap();

        let err = store.get_config("user-2").await.unwrap_err();
        assert!(matches!(err, Error::PolicyNotFound(ref id) if id == "user-2"));
        assert_eq!(err.to_string(), "Configuration not found for user: user-2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_same_key() {
        let store = Arc::new(InMemoryConfigStore::new());

        let mut handles = Vec::new();
        for age in 1..=32u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_config("shared", policy(age)).await.unwrap();
                // Readers interleaved with writers must always see a whole entry
                let seen = store.get_config("shared").await.unwrap();
                assert_eq!(seen.excluded_countries, vec!["PRK".to_string()]);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let last = store.get_config("shared").await.unwrap();
        let age = last.minimum_age.unwrap();
        assert!((1..=32).contains(&age));
        assert_eq!(last, policy(age));
    }

    #[tokio::test]
    async fn test_identity_action_id() {
        let store = InMemoryConfigStore::new();
        let id = store.get_action_id("user-1", "68656c6c6f").await.unwrap();
        assert_eq!(id, "user-1");
    }

    #[tokio::test]
    async fn test_custom_action_id_resolver() {
        let store = InMemoryConfigStore::with_action_id_resolver(Arc::new(|user: &str, data: &str| {
            format!("{}:{}", user, data)
        }));

        let id = store.get_action_id("user-1", "abcd").await.unwrap();
        assert_eq!(id, "user-1:abcd");
    }

    #[tokio::test]
    async fn test_policy_json_survives_store() {
        let store = InMemoryConfigStore::new();
        let config: VerificationConfig =
            serde_json::from_value(serde_json::json!({ "minimumAge": 18 })).unwrap();

        store.set_config("u1", config).await.unwrap();

        let json = serde_json::to_value(store.get_config("u1").await.unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "minimumAge": 18 }));
    }

    #[tokio::test]
    async fn test_close_is_noop() {
        let store = InMemoryConfigStore::new();
        store.set_config("user-1", policy(18)).await.unwrap();
        store.close().await.unwrap();
        assert!(store.get_config("user-1").await.is_ok());
    }
}
