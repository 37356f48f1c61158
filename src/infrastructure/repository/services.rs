use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, CacheSettings, RepositorySettings};
use crate::domain::metadata::{MetadataResolver, TypeNameCache};
use crate::domain::query::ScopeProvider;
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheFactory, ProgressiveCache};

/// Collaborators shared by every repository
#[derive(Clone)]
pub struct RepositoryServices {
    pub cache: Arc<ProgressiveCache>,
    pub metadata: MetadataResolver,
    pub scope: Arc<dyn ScopeProvider>,
    pub cache_settings: CacheSettings,
    pub repository_settings: RepositorySettings,
}

impl std::fmt::Debug for RepositoryServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryServices")
            .field("cache", &self.cache)
            .field("metadata", &self.metadata)
            .field("cache_settings", &self.cache_settings)
            .field("repository_settings", &self.repository_settings)
            .finish()
    }
}

impl RepositoryServices {
    pub fn new(
        cache: Arc<ProgressiveCache>,
        metadata: MetadataResolver,
        scope: Arc<dyn ScopeProvider>,
        cache_settings: CacheSettings,
        repository_settings: RepositorySettings,
    ) -> Self {
        Self {
            cache,
            metadata,
            scope,
            cache_settings,
            repository_settings,
        }
    }

    /// Builds the store selected by `config.cache` and a fresh type name cache
    pub fn from_config(
        config: &AppConfig,
        scope: Arc<dyn ScopeProvider>,
    ) -> Result<Self, DomainError> {
        let store = CacheFactory::new().create(&config.cache)?;

        info!(
            store = %config.cache.store,
            enabled = config.cache.enabled,
            cache_minutes = config.cache.cache_minutes,
            "Repository services initialized"
        );

        Ok(Self::new(
            Arc::new(ProgressiveCache::new(store)),
            MetadataResolver::new(TypeNameCache::new()),
            scope,
            config.cache.clone(),
            config.repository.clone(),
        ))
    }
}
