//! Progressive cache: get-or-compute with at most one compute per key
//!
//! A miss starts a load on the runtime and registers it in the in-flight
//! table; concurrent callers for the same key await that load instead of
//! computing again. Every waiter observes the same outcome, value or error.
//! The load is spawned rather than driven by its first caller, so cancelling
//! any caller only ends that caller's wait.
//!
//! Invalidations that land while loads are running are stamped with an epoch.
//! A load whose dependencies were invalidated after it started does not keep
//! its result in the store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::cache::{
    CacheKey, CachePolicy, CacheStore, CacheStoreExt, DependencyKey, DependencyKeySet,
    EntryOptions, IsEmpty,
};
use crate::domain::lock::mutex_lock;
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_cache_hit, record_cache_miss, record_cache_skip, record_cache_store,
    record_invalidation, SkipReason,
};

const SOURCE: &str = "cache::progressive";

/// Serialized outcome shared between the waiters of one load
type LoadOutcome = Result<Arc<str>, DomainError>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;
type Loads = Arc<Mutex<LoadTable>>;

/// Running loads and the invalidations they have to observe
#[derive(Default)]
struct LoadTable {
    running: HashMap<String, (u64, SharedLoad)>,
    epoch: u64,
    invalidated: HashMap<DependencyKey, u64>,
    cleared: u64,
}

impl LoadTable {
    /// Stamps an invalidation; `None` stands for the whole store.
    /// Nothing is kept while no load is running.
    fn stamp(&mut self, dependency: Option<&DependencyKey>) {
        if self.running.is_empty() {
            return;
        }

        self.epoch += 1;
        match dependency {
            Some(dependency) => {
                self.invalidated.insert(dependency.clone(), self.epoch);
            }
            None => self.cleared = self.epoch,
        }
    }

    fn invalidated_since(&self, started: u64, dependencies: &DependencyKeySet) -> bool {
        self.cleared > started
            || dependencies.iter().any(|dependency| {
                self.invalidated
                    .get(dependency)
                    .is_some_and(|epoch| *epoch > started)
            })
    }
}

/// A computed value and the dependency keys that keep it valid
#[derive(Debug, Clone)]
pub struct Computed<T> {
    pub value: T,
    pub dependencies: DependencyKeySet,
}

impl<T> Computed<T> {
    pub fn new(value: T, dependencies: DependencyKeySet) -> Self {
        Self {
            value,
            dependencies,
        }
    }
}

/// Get-or-compute engine over a `CacheStore`
pub struct ProgressiveCache {
    store: Arc<dyn CacheStore>,
    loads: Loads,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ProgressiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveCache")
            .field("store", &self.store)
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

impl ProgressiveCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            loads: Arc::new(Mutex::new(LoadTable::default())),
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Returns the cached value for `key`, or computes it exactly once among
    /// concurrent callers.
    ///
    /// The computed value is stored only when it is non-empty (if
    /// `policy.skip_if_empty`) and carries at least one dependency key.
    pub async fn load_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        policy: &CachePolicy,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned + IsEmpty + Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>, DomainError>> + Send + 'static,
    {
        self.load_or_compute_with_timeout(key, policy, cancel, None, compute)
            .await
    }

    /// Like `load_or_compute`, but gives up waiting after `timeout`.
    ///
    /// An expired wait fails with `DomainError::Cancelled`, exactly like a
    /// cancelled one; the shared load keeps running for the other waiters.
    pub async fn load_or_compute_with_timeout<T, F, Fut>(
        &self,
        key: &CacheKey,
        policy: &CachePolicy,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
        compute: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned + IsEmpty + Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>, DomainError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(cancelled(key));
        }

        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        let cached = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(key)),
            _ = expire(deadline) => return Err(timed_out(key)),
            cached = self.store.get::<T>(key.as_str()) => cached?,
        };

        if let Some(value) = cached {
            record_cache_hit();
            debug!(cache_key = %key, "Cache hit");
            return Ok(value);
        }

        record_cache_miss();
        let load = self.join_or_start(key, *policy, compute);

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(key)),
            _ = expire(deadline) => return Err(timed_out(key)),
            outcome = load => outcome?,
        };

        decode(&data)
    }

    /// Evicts every entry depending on `dependency`, including results of
    /// loads still running
    pub async fn invalidate(&self, dependency: &DependencyKey) -> Result<usize, DomainError> {
        mutex_lock(&self.loads, SOURCE, "invalidate").stamp(Some(dependency));

        let evicted = self.store.invalidate(dependency).await?;
        record_invalidation(evicted);
        debug!(dependency = %dependency, evicted, "Dependency invalidated");
        Ok(evicted)
    }

    /// Evicts every entry depending on any of `dependencies`
    pub async fn invalidate_all<'a, I>(&self, dependencies: I) -> Result<usize, DomainError>
    where
        I: IntoIterator<Item = &'a DependencyKey>,
    {
        let mut evicted = 0;
        for dependency in dependencies {
            evicted += self.invalidate(dependency).await?;
        }
        Ok(evicted)
    }

    pub async fn remove(&self, key: &CacheKey) -> Result<bool, DomainError> {
        self.store.remove(key.as_str()).await
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        mutex_lock(&self.loads, SOURCE, "clear").stamp(None);
        self.store.clear().await
    }

    /// Number of loads currently running
    pub fn in_flight_count(&self) -> usize {
        mutex_lock(&self.loads, SOURCE, "in_flight_count")
            .running
            .len()
    }

    /// Signals running computes to stop; their waiters receive the compute's outcome
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn join_or_start<T, F, Fut>(&self, key: &CacheKey, policy: CachePolicy, compute: F) -> SharedLoad
    where
        T: Serialize + IsEmpty + Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>, DomainError>> + Send + 'static,
    {
        let mut loads = mutex_lock(&self.loads, SOURCE, "join_or_start");

        if let Some((_, existing)) = loads.running.get(key.as_str()) {
            debug!(cache_key = %key, "Joining in-flight load");
            return existing.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let load = Load {
            store: self.store.clone(),
            key: key.clone(),
            policy,
            started: loads.epoch,
            guard: InFlightGuard {
                loads: self.loads.clone(),
                key: key.as_str().to_string(),
                generation,
            },
        };

        let task = tokio::spawn(load.run(self.shutdown.child_token(), compute));

        let shared = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(DomainError::internal(format!("Cache load task failed: {}", e))),
            }
        }
        .boxed()
        .shared();

        loads
            .running
            .insert(key.as_str().to_string(), (generation, shared.clone()));
        shared
    }
}

/// Removes a finished load from the in-flight table, also when the compute panics
struct InFlightGuard {
    loads: Loads,
    key: String,
    generation: u64,
}

impl InFlightGuard {
    fn invalidated_since(&self, started: u64, dependencies: &DependencyKeySet) -> bool {
        mutex_lock(&self.loads, SOURCE, "invalidated_since").invalidated_since(started, dependencies)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut loads = mutex_lock(&self.loads, SOURCE, "release");
        if matches!(loads.running.get(&self.key), Some((generation, _)) if *generation == self.generation)
        {
            loads.running.remove(&self.key);
        }
        if loads.running.is_empty() {
            loads.invalidated.clear();
        }
    }
}

/// One spawned load; `started` is the invalidation epoch it observed
struct Load {
    store: Arc<dyn CacheStore>,
    key: CacheKey,
    policy: CachePolicy,
    started: u64,
    guard: InFlightGuard,
}

impl Load {
    async fn run<T, F, Fut>(self, token: CancellationToken, compute: F) -> LoadOutcome
    where
        T: Serialize + IsEmpty + Send + 'static,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Computed<T>, DomainError>> + Send + 'static,
    {
        let Load {
            store,
            key,
            policy,
            started,
            guard,
        } = self;

        if let Some(data) = store.get_raw(key.as_str()).await? {
            debug!(cache_key = %key, "Populated by a previous load");
            return Ok(Arc::from(data));
        }

        let Computed {
            value,
            dependencies,
        } = compute(token).await?;

        let data = serde_json::to_string(&value)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cache value: {}", e)))?;

        if policy.skip_if_empty && value.is_empty_value() {
            record_cache_skip(SkipReason::EmptyValue);
            debug!(cache_key = %key, "Empty result not cached");
        } else if dependencies.is_empty() {
            record_cache_skip(SkipReason::NoDependencies);
            debug!(cache_key = %key, "Result without dependency keys not cached");
        } else if guard.invalidated_since(started, &dependencies) {
            record_cache_skip(SkipReason::Invalidated);
            debug!(cache_key = %key, "Dependency invalidated during load, result not cached");
        } else {
            debug!(cache_key = %key, dependencies = %dependencies, "Caching computed value");
            store
                .set_raw(key.as_str(), data.clone(), EntryOptions::new(&policy, dependencies.clone()))
                .await?;

            // An invalidation stamped after the check above may have run
            // before the entry was indexed.
            if guard.invalidated_since(started, &dependencies) {
                store.remove(key.as_str()).await?;
                record_cache_skip(SkipReason::Invalidated);
                debug!(cache_key = %key, "Dependency invalidated while storing, entry removed");
            } else {
                record_cache_store();
            }
        }

        Ok(Arc::from(data))
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn decode<T: DeserializeOwned>(data: &str) -> Result<T, DomainError> {
    serde_json::from_str(data)
        .map_err(|e| DomainError::cache(format!("Failed to deserialize cache value: {}", e)))
}

fn cancelled(key: &CacheKey) -> DomainError {
    DomainError::cancelled(format!("Load of '{}' cancelled", key))
}

fn timed_out(key: &CacheKey) -> DomainError {
    DomainError::cancelled(format!("Load of '{}' timed out", key))
}
