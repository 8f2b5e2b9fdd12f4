use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::StoreType;

/// An error resulting from operations on a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error while reading or writing the backing storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error, usually a corrupt entry.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// The OS credential manager rejected the operation.
    #[error("Failed to access {helper}: {message}")]
    Credential {
        /// Name of the credential helper that failed.
        helper: &'static str,
        /// Error reported by the helper.
        message: String,
    },

    /// The configured store type is unknown.
    #[error(
        "'{0}' key store not supported. Please choose from: ['file', 'keyring', 'pass_linux', 'wincred', 'none']"
    )]
    UnsupportedStoreType(String),

    /// The configured store type exists but not on this operating system.
    #[error("'{store_type}' option for store.type is supported on {os} only")]
    UnsupportedPlatform {
        /// The requested store type tag.
        store_type: String,
        /// The only operating system supporting it.
        os: &'static str,
    },

    /// Neither `HOME` nor `USERPROFILE` is set, so no default location exists.
    #[error("Home directory not found (HOME or USERPROFILE environment variable not set)")]
    HomeDirNotFound,

    /// A wipe stopped part way through.
    #[error("Wipe interrupted. Failure to delete key '{key}': {source}")]
    WipeInterrupted {
        /// The key that could not be deleted.
        key: String,
        /// Why the deletion failed.
        #[source]
        source: Box<StoreError>,
    },
}

/// A string-keyed persistent store holding JSON documents.
///
/// Backends are interchangeable: callers depend on this trait only and never on which
/// backend is active. Values cross the boundary as JSON strings so the trait stays object
/// safe; use [`KeyStoreExt`] for typed access.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    /// The tag of the backend.
    fn store_type(&self) -> StoreType;

    /// Retrieves the raw document stored under `key`, or `None` when absent.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `data` under `key`, replacing any previous value.
    async fn store_raw(&self, key: &str, data: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists all keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Deletes every key starting with `prefix`.
    ///
    /// Stops at the first key that cannot be deleted.
    async fn wipe(&self, prefix: &str) -> Result<(), StoreError> {
        for key in self.list(prefix).await? {
            if let Err(e) = self.delete(&key).await {
                return Err(StoreError::WipeInterrupted {
                    key,
                    source: Box::new(e),
                });
            }
        }
        Ok(())
    }
}

/// Typed access on top of [`KeyStore`], serializing values with `serde_json`.
#[async_trait::async_trait]
pub trait KeyStoreExt: KeyStore {
    /// Retrieves and deserializes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serde`] when the stored document does not match `T`.
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores `value` under `key`, replacing any previous value.
    async fn store<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store_raw(key, &raw).await
    }
}

impl<S: KeyStore + ?Sized> KeyStoreExt for S {}
