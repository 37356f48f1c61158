//! Cache store factory for runtime selection

use std::sync::Arc;

use serde::Deserialize;

use crate::config::CacheSettings;
use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCacheConfig, InMemoryCacheStore};
use super::null::NullCacheStore;

/// Supported cache store types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum CacheType {
    /// In-memory store using moka
    #[default]
    InMemory,
    /// Remembers nothing; concurrent loads are still coalesced
    None,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for CacheType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheType::InMemory),
            "none" | "null" => Ok(CacheType::None),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache type: {}. Valid types: in_memory, none",
                s
            ))),
        }
    }
}

impl TryFrom<String> for CacheType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Factory for creating cache stores
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a store based on configuration
    pub fn create(&self, settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, DomainError> {
        match settings.store {
            CacheType::InMemory => {
                if settings.max_capacity == 0 {
                    return Err(DomainError::configuration(
                        "cache.max_capacity must be greater than zero",
                    ));
                }

                let config =
                    InMemoryCacheConfig::default().with_max_capacity(settings.max_capacity);
                Ok(Arc::new(InMemoryCacheStore::with_config(config)))
            }
            CacheType::None => Ok(Arc::new(NullCacheStore::new())),
        }
    }
}
