use std::{
    collections::BTreeMap,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use thy_store::{KeyStore, StoreError, StoreType};

/// In-memory [`KeyStore`] counting the calls made to it, with optional failure injection.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    gets: AtomicUsize,
    stores: AtomicUsize,
    wipes: AtomicUsize,
    fail_reads: bool,
    fail_writes: bool,
    fail_wipe: Option<String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get_raw` fail.
    pub fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every `store_raw` fail.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Make `wipe` fail for exactly this prefix.
    pub fn with_failing_wipe(mut self, prefix: impl Into<String>) -> Self {
        self.fail_wipe = Some(prefix.into());
        self
    }

    /// A copy of everything currently stored.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.data().clone()
    }

    /// Number of `get_raw` calls.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `store_raw` calls.
    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Number of `wipe` calls.
    pub fn wipes(&self) -> usize {
        self.wipes.load(Ordering::SeqCst)
    }

    fn data(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn injected(operation: &str) -> StoreError {
    StoreError::Io(io::Error::other(format!("injected {operation} failure")))
}

#[async_trait::async_trait]
impl KeyStore for MemoryStore {
    fn store_type(&self) -> StoreType {
        StoreType::File
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(injected("read"));
        }
        Ok(self.data().get(key).cloned())
    }

    async fn store_raw(&self, key: &str, data: &str) -> Result<(), StoreError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(injected("write"));
        }
        self.data().insert(key.to_string(), data.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .data()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn wipe(&self, prefix: &str) -> Result<(), StoreError> {
        self.wipes.fetch_add(1, Ordering::SeqCst);
        if self.fail_wipe.as_deref() == Some(prefix) {
            return Err(injected("wipe"));
        }
        self.data().retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls() {
        let store = MemoryStore::new();
        store.store_raw("a", "1").await.unwrap();
        store.get_raw("a").await.unwrap();
        store.get_raw("b").await.unwrap();

        assert_eq!(store.stores(), 1);
        assert_eq!(store.gets(), 2);
        assert_eq!(store.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new()
            .with_failing_reads()
            .with_failing_writes()
            .with_failing_wipe("x");

        assert!(store.get_raw("a").await.is_err());
        assert!(store.store_raw("a", "1").await.is_err());
        assert!(store.wipe("x").await.is_err());
        assert!(store.wipe("y").await.is_ok());
    }
}
