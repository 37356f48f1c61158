//! Cache store port

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::dependency::{DependencyKey, DependencyKeySet};
use super::policy::CachePolicy;
use crate::domain::DomainError;

/// Options attached to a stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOptions {
    pub ttl: Duration,
    /// Each read pushes expiry `ttl` further out
    pub sliding: bool,
    pub dependencies: DependencyKeySet,
}

impl EntryOptions {
    pub fn new(policy: &CachePolicy, dependencies: DependencyKeySet) -> Self {
        Self {
            ttl: policy.ttl,
            sliding: policy.use_sliding_expiration,
            dependencies,
        }
    }
}

/// Key-value store indexed by dependency keys
///
/// This trait uses JSON strings internally to be dyn-compatible.
/// Use `CacheStoreExt` for typed get/set operations.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Gets a raw JSON value, `None` when absent or expired
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value and indexes it under its dependencies
    async fn set_raw(&self, key: &str, value: String, options: EntryOptions)
        -> Result<(), DomainError>;

    /// Removes a single entry
    async fn remove(&self, key: &str) -> Result<bool, DomainError>;

    /// Evicts every entry depending on `dependency`, returning how many were evicted
    async fn invalidate(&self, dependency: &DependencyKey) -> Result<usize, DomainError>;

    /// Clears all entries
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of entries
    async fn size(&self) -> Result<usize, DomainError>;
}

/// Extension trait providing typed get/set operations
pub trait CacheStoreExt: CacheStore {
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        options: EntryOptions,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, data, options).await
        }
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock store for testing: no expiry, counts operations, can fail on demand
    #[derive(Debug, Default)]
    pub struct MockCacheStore {
        entries: Mutex<HashMap<String, (String, EntryOptions)>>,
        error: Mutex<Option<String>>,
        gets: AtomicUsize,
        sets: AtomicUsize,
    }

    impl MockCacheStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn get_count(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub fn set_count(&self) -> usize {
            self.sets.load(Ordering::SeqCst)
        }

        pub fn options_for(&self, key: &str) -> Option<EntryOptions> {
            self.entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(_, options)| options.clone())
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::upstream("mock-cache", error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for MockCacheStore {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check_error()?;
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(key)
                .map(|(data, _)| data.clone()))
        }

        async fn set_raw(
            &self,
            key: &str,
            value: String,
            options: EntryOptions,
        ) -> Result<(), DomainError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.check_error()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value, options));
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn invalidate(&self, dependency: &DependencyKey) -> Result<usize, DomainError> {
            self.check_error()?;
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|_, (_, options)| !options.dependencies.contains(dependency));
            Ok(before - entries.len())
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn options(keys: &[&str]) -> EntryOptions {
            EntryOptions {
                ttl: Duration::from_secs(60),
                sliding: false,
                dependencies: keys.iter().map(|k| DependencyKey::new(*k)).collect(),
            }
        }

        #[tokio::test]
        async fn test_mock_store_set_get() {
            let store = MockCacheStore::new();
            store
                .set("key1", &vec![1, 2, 3], options(&["contentitem|byid|1"]))
                .await
                .unwrap();

            let result: Option<Vec<i32>> = store.get("key1").await.unwrap();
            assert_eq!(result, Some(vec![1, 2, 3]));
            assert_eq!(store.set_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_store_invalidate() {
            let store = MockCacheStore::new();
            store
                .set("a", &1, options(&["contentitem|byid|1"]))
                .await
                .unwrap();
            store
                .set("b", &2, options(&["contentitem|byid|2"]))
                .await
                .unwrap();

            let evicted = store
                .invalidate(&DependencyKey::new("CONTENTITEM|BYID|1"))
                .await
                .unwrap();
            assert_eq!(evicted, 1);
            assert_eq!(store.size().await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_mock_store_with_error() {
            let store = MockCacheStore::new().with_error("down");

            let result: Result<Option<String>, _> = store.get("key").await;
            assert!(result.unwrap_err().is_upstream());
        }

        #[tokio::test]
        async fn test_deserialize_failure_is_cache_error() {
            let store = MockCacheStore::new();
            store
                .set("key", &"not a number", options(&["x|y|z"]))
                .await
                .unwrap();

            let result: Result<Option<i32>, _> = store.get("key").await;
            assert!(matches!(result, Err(DomainError::Cache { .. })));
        }
    }
}
