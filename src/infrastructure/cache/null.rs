//! Store that remembers nothing
//!
//! With this store `ProgressiveCache` still coalesces concurrent loads of the
//! same key but every sequential call recomputes.

use async_trait::async_trait;

use crate::domain::cache::{CacheStore, DependencyKey, EntryOptions};
use crate::domain::DomainError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCacheStore;

impl NullCacheStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NullCacheStore {
    async fn get_raw(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }

    async fn set_raw(
        &self,
        _key: &str,
        _value: String,
        _options: EntryOptions,
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool, DomainError> {
        Ok(false)
    }

    async fn invalidate(&self, _dependency: &DependencyKey) -> Result<usize, DomainError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CachePolicy, CacheStoreExt, DependencyKeySet};

    #[tokio::test]
    async fn test_null_store_never_remembers() {
        let store = NullCacheStore::new();
        let dependencies: DependencyKeySet =
            std::iter::once(DependencyKey::content_item_by_id(1)).collect();

        store
            .set("key", &1, EntryOptions::new(&CachePolicy::default(), dependencies))
            .await
            .unwrap();

        assert!(store.get::<i32>("key").await.unwrap().is_none());
        assert_eq!(store.size().await.unwrap(), 0);
    }
}
