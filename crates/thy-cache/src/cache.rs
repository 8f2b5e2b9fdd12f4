use std::{borrow::Cow, collections::HashMap, sync::Arc};

use chrono::Utc;
use thy_api::{ApiConfiguration, ApiError, Method, ResourceLocator, Transport, SUFFIX_DESCRIPTION};
use thy_store::{KeyStore, KeyStoreExt, StoreError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{CacheConfig, CacheNamespace, CacheScope, CacheStrategy, CachedSecret, ReadError};

const RESOURCE_SECRET: &str = "secret";

/// Which representation of a secret to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretView {
    /// The current value.
    Current,
    /// The description, without the secret data.
    Description,
    /// A specific historical version. Never cached.
    Version(u32),
}

impl SecretView {
    fn suffix(&self) -> Cow<'static, str> {
        match self {
            SecretView::Current => Cow::Borrowed(""),
            SecretView::Description => Cow::Borrowed(SUFFIX_DESCRIPTION),
            SecretView::Version(version) => Cow::Owned(format!("/version/{version}")),
        }
    }

    fn namespace(&self) -> Option<CacheNamespace> {
        match self {
            SecretView::Current => Some(CacheNamespace::Secret),
            SecretView::Description => Some(CacheNamespace::SecretDescription),
            SecretView::Version(_) => None,
        }
    }
}

/// Remove every cached secret and description of `scope` from `store`.
///
/// Both namespaces are always wiped; the first failure is returned. Entries of other profiles
/// are kept.
pub async fn bust_cache(store: &dyn KeyStore, scope: &CacheScope) -> Result<(), StoreError> {
    let mut result = Ok(());

    for namespace in CacheNamespace::ALL {
        let root = scope.root(namespace);
        if let Err(e) = store.wipe(&root).await {
            warn!(prefix = %root, "Failed to clear cache: {e}");
            if result.is_ok() {
                result = Err(e);
            }
        }
    }

    if result.is_ok() {
        info!("Successfully cleared local cache");
    }
    result
}

/// Reads secrets from the vault, keeping local copies according to a [`CacheStrategy`].
pub struct SecretCache {
    config: CacheConfig,
    store: Arc<dyn KeyStore>,
    transport: Arc<dyn Transport>,
    api: ApiConfiguration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SecretCache {
    /// Create a cache reading through `transport` and keeping copies in `store`.
    pub fn new(
        config: CacheConfig,
        store: Arc<dyn KeyStore>,
        transport: Arc<dyn Transport>,
        api: ApiConfiguration,
    ) -> Self {
        if config.strategy.is_enabled() && config.age_minutes <= 0 {
            warn!(
                age = config.age_minutes,
                "Invalid cache age, cached secrets are treated as expired"
            );
        }

        Self {
            config,
            store,
            transport,
            api,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The settings this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read the description of a secret.
    pub async fn describe(&self, locator: &ResourceLocator) -> Result<Vec<u8>, ReadError> {
        self.read(locator, false, SecretView::Description).await
    }

    /// Read a secret, from the cache or the server as the strategy dictates.
    ///
    /// Reads with `edit` set and reads of a specific version always go to the server and are
    /// not cached, since their responses differ from the cached representation.
    pub async fn read(
        &self,
        locator: &ResourceLocator,
        edit: bool,
        view: SecretView,
    ) -> Result<Vec<u8>, ReadError> {
        let edit_term = if edit { "true" } else { "false" };
        let uri = self.api.resource_uri(
            RESOURCE_SECRET,
            locator,
            &view.suffix(),
            &[("edit", edit_term)],
        );

        let strategy = self.config.strategy;
        let namespace = match view.namespace() {
            Some(namespace) if strategy.is_enabled() && !edit => namespace,
            _ => return Ok(self.fetch(&uri).await?),
        };

        let key = self.config.scope.key_for(namespace, locator);
        let lock = self.lock_for(&key).await;
        let result = {
            let _guard = lock.lock().await;
            self.read_locked(&key, &uri).await
        };
        self.release_lock(&key, lock).await;
        result
    }

    async fn read_locked(&self, key: &str, uri: &str) -> Result<Vec<u8>, ReadError> {
        let strategy = self.config.strategy;

        let mut expired = None;
        if strategy.prefers_cache() {
            if let Some(entry) = self.lookup(key).await {
                if !entry.is_expired(Utc::now(), self.config.age_minutes) {
                    info!(key, "Returning secret data from cache");
                    return Ok(entry.payload);
                }
                debug!(key, fetched_at = %entry.fetched_at, "Cached secret expired");
                expired = Some(entry);
            }
        }

        let error = match self.fetch(uri).await {
            Ok(payload) => {
                self.try_cache_write(key, &payload).await;
                return Ok(payload);
            }
            Err(error) => error,
        };

        let fallback = match strategy {
            CacheStrategy::ServerThenCache => self.lookup(key).await,
            CacheStrategy::CacheThenServerThenExpired => expired,
            _ => None,
        };

        match fallback {
            Some(entry) => {
                warn!(
                    key,
                    %error,
                    "Failed to retrieve secret from server, returning cached data"
                );
                Ok(entry.payload)
            }
            None => Err(error.into()),
        }
    }

    /// Remove every cached secret and description of the active profile. See [`bust_cache`].
    pub async fn bust_cache(&self) -> Result<(), StoreError> {
        bust_cache(self.store.as_ref(), &self.config.scope).await
    }

    /// Store a freshly fetched payload. Failures are logged and otherwise ignored.
    pub async fn try_cache_write(&self, key: &str, payload: &[u8]) {
        let entry = CachedSecret::new(payload.to_vec());
        match self.store.store(key, &entry).await {
            Ok(()) => debug!(key, "Cached secret"),
            Err(e) => warn!(
                key,
                store_type = %self.store.store_type(),
                "Failed to cache secret: {e}"
            ),
        }
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, ApiError> {
        self.transport.do_request(Method::GET, uri, None).await
    }

    async fn lookup(&self, key: &str) -> Option<CachedSecret> {
        match self.store.get::<CachedSecret>(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    key,
                    store_type = %self.store.store_type(),
                    "Failed to fetch cached secret: {e}"
                );
                None
            }
        }
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drop the lock of `key` once no other read holds or waits for it.
    async fn release_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Clones are only handed out under the map lock, so the count is stable here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }
}
