//! Cache infrastructure - store implementations and the get-or-compute engine

mod dependency_index;
mod factory;
mod in_memory;
mod null;
mod progressive;

pub use dependency_index::DependencyIndex;
pub use factory::{CacheFactory, CacheType};
pub use in_memory::{InMemoryCacheConfig, InMemoryCacheStore};
pub use null::NullCacheStore;
pub use progressive::{Computed, ProgressiveCache};
