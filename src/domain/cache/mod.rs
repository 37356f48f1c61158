//! Cache domain - keys, policies and the store port

mod dependency;
mod key;
mod policy;
mod repository;

pub use dependency::{DependencyKey, DependencyKeySet};
pub use key::{CacheKey, CacheKeyBuilder, KeyPart};
pub use policy::{CachePolicy, IsEmpty};
pub use repository::{CacheStore, CacheStoreExt, EntryOptions};

#[cfg(test)]
pub use repository::mock::MockCacheStore;
