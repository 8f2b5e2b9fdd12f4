use crate::{KeyStore, StoreError, StoreType};

/// A store that persists nothing. Writes succeed and reads always miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneStore;

#[async_trait::async_trait]
impl KeyStore for NoneStore {
    fn store_type(&self) -> StoreType {
        StoreType::None
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn store_raw(&self, _key: &str, _data: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    async fn wipe(&self, _prefix: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_store_never_returns_data() {
        let store = NoneStore;

        store.store_raw("secret-a", "{}").await.unwrap();

        assert_eq!(store.get_raw("secret-a").await.unwrap(), None);
        assert!(store.list("secret").await.unwrap().is_empty());
        store.wipe("secret").await.unwrap();
    }
}
