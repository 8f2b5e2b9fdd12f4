//! Stores backed by an OS credential manager.
//!
//! Credential managers differ a lot in what they offer, so they are wrapped behind the small
//! [`CredentialHelper`] interface and [`SecureStore`] adapts any helper to [`KeyStore`].

use thiserror::Error;
use tracing::debug;

use crate::{KeyStore, StoreError, StoreType};

mod keyring_helper;

pub use keyring_helper::KeyringHelper;

/// The keyring backed store created for the `keyring` store type.
pub type KeyringStore = SecureStore<KeyringHelper>;

/// An error reported by a credential manager.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CredentialError(pub String);

/// Minimal access to a credential manager holding string secrets keyed by name.
pub trait CredentialHelper: Send + Sync {
    /// Human readable name of the credential manager, used in error messages.
    fn name(&self) -> &'static str;

    /// Adds or replaces the credential stored under `key`.
    fn add(&self, key: &str, secret: &str) -> Result<(), CredentialError>;

    /// Retrieves the credential stored under `key`, or `None` when there is none.
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Deletes the credential stored under `key`. Deleting a missing credential is not an error.
    fn delete(&self, key: &str) -> Result<(), CredentialError>;

    /// Lists the keys of all credentials starting with `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<String>, CredentialError>;
}

/// A [`KeyStore`] storing every entry as a credential.
pub struct SecureStore<H> {
    helper: H,
}

impl<H: CredentialHelper> SecureStore<H> {
    /// Wrap a credential helper.
    pub fn new(helper: H) -> Self {
        Self { helper }
    }

    fn error(&self, e: CredentialError) -> StoreError {
        StoreError::Credential {
            helper: self.helper.name(),
            message: e.0,
        }
    }
}

#[async_trait::async_trait]
impl<H: CredentialHelper> KeyStore for SecureStore<H> {
    fn store_type(&self) -> StoreType {
        StoreType::Keyring
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let secret = self.helper.get(key).map_err(|e| self.error(e))?;
        if secret.is_none() {
            debug!(key, helper = self.helper.name(), "No entry found in secure storage");
        }
        Ok(secret)
    }

    async fn store_raw(&self, key: &str, data: &str) -> Result<(), StoreError> {
        self.helper.add(key, data).map_err(|e| self.error(e))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.helper.delete(key).map_err(|e| self.error(e))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = self.helper.list(prefix).map_err(|e| self.error(e))?;
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Mutex};

    use super::*;
    use crate::KeyStoreExt;

    #[derive(Default)]
    struct InMemoryHelper {
        credentials: Mutex<BTreeMap<String, String>>,
        fail_delete: bool,
    }

    impl CredentialHelper for InMemoryHelper {
        fn name(&self) -> &'static str {
            "in-memory"
        }

        fn add(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
            self.credentials
                .lock()
                .unwrap()
                .insert(key.to_string(), secret.to_string());
            Ok(())
        }

        fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
            Ok(self.credentials.lock().unwrap().get(key).cloned())
        }

        fn delete(&self, key: &str) -> Result<(), CredentialError> {
            if self.fail_delete {
                return Err(CredentialError("access denied".to_string()));
            }
            self.credentials.lock().unwrap().remove(key);
            Ok(())
        }

        fn list(&self, prefix: &str) -> Result<Vec<String>, CredentialError> {
            Ok(self
                .credentials
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_helper() {
        let store = SecureStore::new(InMemoryHelper::default());

        store.store("config-auth", &"token".to_string()).await.unwrap();

        let value: Option<String> = store.get("config-auth").await.unwrap();
        assert_eq!(value.as_deref(), Some("token"));
        assert_eq!(store.get::<String>("config-other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wipe_removes_prefixed_credentials_only() {
        let store = SecureStore::new(InMemoryHelper::default());
        store.store_raw("secret-a", "1").await.unwrap();
        store.store_raw("secret-description-a", "2").await.unwrap();
        store.store_raw("token-password", "3").await.unwrap();

        store.wipe("secret").await.unwrap();

        assert_eq!(
            store.list("").await.unwrap(),
            vec!["token-password".to_string()]
        );
    }

    #[tokio::test]
    async fn test_helper_failure_is_reported_with_helper_name() {
        let helper = InMemoryHelper {
            fail_delete: true,
            ..Default::default()
        };
        let store = SecureStore::new(helper);
        store.store_raw("secret-a", "1").await.unwrap();

        match store.wipe("secret").await.unwrap_err() {
            StoreError::WipeInterrupted { key, source } => {
                assert_eq!(key, "secret-a");
                assert!(matches!(
                    *source,
                    StoreError::Credential {
                        helper: "in-memory",
                        ..
                    }
                ));
            }
            other => panic!("expected WipeInterrupted, got {other:?}"),
        }
    }
}
