//! In-memory cache store using moka

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::notification::RemovalCause;
use moka::Expiry;

use super::dependency_index::DependencyIndex;
use crate::domain::cache::{CacheStore, DependencyKey, EntryOptions};
use crate::domain::DomainError;

/// Configuration for in-memory cache store
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct StoredEntry {
    /// Serialized JSON value
    data: Arc<str>,
    ttl: Duration,
    sliding: bool,
}

/// Per-entry absolute or sliding expiration
struct EntryExpiry;

impl Expiry<String, StoredEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &StoredEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        if value.sliding {
            Some(value.ttl)
        } else {
            duration_until_expiry
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Thread-safe in-memory store with dependency-key invalidation
///
/// Features:
/// - Absolute or sliding TTL per entry
/// - LRU-like eviction when capacity is reached
/// - Eviction of every entry depending on a changed entity
#[derive(Debug)]
pub struct InMemoryCacheStore {
    cache: MokaCache<String, StoredEntry>,
    index: Arc<DependencyIndex>,
    config: InMemoryCacheConfig,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let index = Arc::new(DependencyIndex::new());
        let listener_index = index.clone();

        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry)
            .eviction_listener(move |key: Arc<String>, _entry, cause| {
                // A replaced entry is re-registered by `set_raw`.
                if cause != RemovalCause::Replaced {
                    listener_index.unregister(key.as_str());
                }
            })
            .build();

        Self {
            cache,
            index,
            config,
        }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    /// Number of dependency keys currently tracked
    pub fn tracked_dependencies(&self) -> usize {
        self.index.dependency_count()
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.cache.get(key).await.map(|entry| entry.data.to_string()))
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        options: EntryOptions,
    ) -> Result<(), DomainError> {
        let entry = StoredEntry {
            data: Arc::from(value),
            ttl: options.ttl,
            sliding: options.sliding,
        };

        self.cache.insert(key.to_string(), entry).await;
        self.index.register(key, &options.dependencies);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn invalidate(&self, dependency: &DependencyKey) -> Result<usize, DomainError> {
        let mut evicted = 0;

        for key in self.index.take_dependents(dependency) {
            if self.cache.remove(&key).await.is_some() {
                evicted += 1;
            }
        }

        tracing::debug!(dependency = %dependency, evicted, "Invalidated cache dependency");
        Ok(evicted)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.index.clear();
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
