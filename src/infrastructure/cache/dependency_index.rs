//! Bidirectional dependency index
//!
//! Tracks which cache entries depend on which dependency keys so that an
//! entity change can evict exactly the affected entries.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::domain::cache::{DependencyKey, DependencyKeySet};
use crate::domain::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::dependency_index";

#[derive(Debug, Default)]
struct IndexState {
    /// Dependency key → cache keys depending on it
    dependents: HashMap<DependencyKey, HashSet<String>>,
    /// Cache key → its dependency keys
    dependencies: HashMap<String, DependencyKeySet>,
}

/// Maps dependency keys to cache keys and back
#[derive(Debug, Default)]
pub struct DependencyIndex {
    state: RwLock<IndexState>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `cache_key` under each of its dependencies, replacing any
    /// previous registration for the same key
    pub fn register(&self, cache_key: &str, dependencies: &DependencyKeySet) {
        let mut state = rw_write(&self.state, SOURCE, "register");

        Self::detach(&mut state, cache_key);

        for dependency in dependencies.iter() {
            state
                .dependents
                .entry(dependency.clone())
                .or_default()
                .insert(cache_key.to_string());
        }
        state
            .dependencies
            .insert(cache_key.to_string(), dependencies.clone());
    }

    /// Removes a cache key and its dependency mappings
    pub fn unregister(&self, cache_key: &str) {
        let mut state = rw_write(&self.state, SOURCE, "unregister");
        Self::detach(&mut state, cache_key);
    }

    /// Removes a dependency key, returning the cache keys that depended on it
    pub fn take_dependents(&self, dependency: &DependencyKey) -> HashSet<String> {
        let mut state = rw_write(&self.state, SOURCE, "take_dependents");
        let affected = state.dependents.remove(dependency).unwrap_or_default();

        for cache_key in &affected {
            Self::detach(&mut state, cache_key);
        }

        affected
    }

    pub fn clear(&self) {
        let mut state = rw_write(&self.state, SOURCE, "clear");
        state.dependents.clear();
        state.dependencies.clear();
    }

    pub fn dependency_count(&self) -> usize {
        rw_read(&self.state, SOURCE, "dependency_count").dependents.len()
    }

    fn detach(state: &mut IndexState, cache_key: &str) {
        if let Some(dependencies) = state.dependencies.remove(cache_key) {
            for dependency in dependencies.iter() {
                if let Some(keys) = state.dependents.get_mut(dependency) {
                    keys.remove(cache_key);
                    if keys.is_empty() {
                        state.dependents.remove(dependency);
                    }
                }
            }
        }
    }
}
