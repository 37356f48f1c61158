//! Repository Registry
//!
//! Repositories are registered once at startup under the identifier their item
//! type declares and looked up by type afterwards.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::query_repository::{QueryRepository, RepositoryItem};
use super::RepositoryServices;
use crate::domain::cache::DependencyKey;
use crate::domain::query::QueryExecutor;
use crate::domain::repository::EntityKind;
use crate::domain::DomainError;

struct RegistryEntry {
    kind: EntityKind,
    rust_type: &'static str,
    repository: Arc<dyn Any + Send + Sync>,
}

/// Repositories keyed by content type (or reusable schema) name
pub struct RepositoryRegistry {
    services: Arc<RepositoryServices>,
    repositories: RwLock<HashMap<String, RegistryEntry>>,
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

impl RepositoryRegistry {
    pub fn new(services: Arc<RepositoryServices>) -> Self {
        Self {
            services,
            repositories: RwLock::new(HashMap::new()),
        }
    }

    pub fn services(&self) -> &Arc<RepositoryServices> {
        &self.services
    }

    /// Creates and registers the repository for `T`
    pub async fn register<T: RepositoryItem>(
        &self,
        kind: EntityKind,
        executor: Arc<dyn QueryExecutor<T>>,
    ) -> Result<Arc<QueryRepository<T>>, DomainError> {
        let tag = self.tag_for::<T>()?;
        let mut repositories = self.repositories.write().await;

        if let Some(existing) = repositories.get(&tag) {
            return Err(DomainError::configuration(format!(
                "Repository for '{}' already registered by type '{}'",
                tag, existing.rust_type
            )));
        }

        let repository = Arc::new(QueryRepository::new(kind, executor, self.services.clone()));

        info!(tag = %tag, kind = %kind, rust_type = type_name::<T>(), "Registering repository");

        repositories.insert(
            tag,
            RegistryEntry {
                kind,
                rust_type: type_name::<T>(),
                repository: repository.clone(),
            },
        );

        Ok(repository)
    }

    /// Returns the repository registered for `T`
    pub async fn get<T: RepositoryItem>(&self) -> Result<Arc<QueryRepository<T>>, DomainError> {
        let tag = self.tag_for::<T>()?;
        let repositories = self.repositories.read().await;

        let entry = repositories.get(&tag).ok_or_else(|| {
            DomainError::configuration(format!("No repository registered for '{}'", tag))
        })?;

        entry
            .repository
            .clone()
            .downcast::<QueryRepository<T>>()
            .map_err(|_| {
                DomainError::configuration(format!(
                    "Repository for '{}' was registered by type '{}', not '{}'",
                    tag,
                    entry.rust_type,
                    type_name::<T>()
                ))
            })
    }

    pub async fn contains(&self, tag: &str) -> bool {
        self.repositories.read().await.contains_key(tag)
    }

    /// Entity kind of the repository registered under `tag`
    pub async fn kind_of(&self, tag: &str) -> Option<EntityKind> {
        self.repositories.read().await.get(tag).map(|entry| entry.kind)
    }

    /// Registered tags, sorted
    pub async fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.repositories.read().await.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Evicts every cached result depending on `dependency`, across all repositories
    pub async fn invalidate(&self, dependency: &DependencyKey) -> Result<usize, DomainError> {
        self.services.cache.invalidate(dependency).await
    }

    fn tag_for<T: RepositoryItem>(&self) -> Result<String, DomainError> {
        let metadata = &self.services.metadata;

        metadata
            .content_type_name::<T>()
            .or_else(|| metadata.reusable_schema_name::<T>())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Type '{}' declares neither a content type nor a reusable schema",
                    type_name::<T>()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::ScopeContext;
    use crate::domain::repository::{ContentRepository, ReadOptions, ReusableSchemaRepository};
    use crate::infrastructure::repository::query_repository::testing::*;
    use tokio_util::sync::CancellationToken;

    fn registry() -> RepositoryRegistry {
        RepositoryRegistry::new(services(ScopeContext::live()))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = registry();
        let executor = Arc::new(FakeExecutor::returning(vec![article(1)]));

        registry
            .register::<Article>(EntityKind::ContentItem, executor.clone())
            .await
            .unwrap();

        assert!(registry.contains("Acme.Article").await);
        assert_eq!(
            registry.kind_of("Acme.Article").await,
            Some(EntityKind::ContentItem)
        );

        let repository = registry.get::<Article>().await.unwrap();
        let item = repository
            .get_by_id(1, &ReadOptions::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(item.is_some());
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let registry = registry();

        registry
            .register::<Article>(
                EntityKind::ContentItem,
                Arc::new(FakeExecutor::returning(Vec::new())),
            )
            .await
            .unwrap();

        let result = registry
            .register::<Article>(
                EntityKind::ContentItem,
                Arc::new(FakeExecutor::returning(Vec::new())),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_get_unregistered() {
        let registry = registry();

        let result = registry.get::<LandingPage>().await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_unmarked_type_rejected() {
        let registry = registry();

        let result = registry
            .register::<Unmarked>(
                EntityKind::ContentItem,
                Arc::new(FakeExecutor::returning(Vec::new())),
            )
            .await;
        assert!(result.is_err());
        assert!(registry.tags().await.is_empty());
    }

    #[tokio::test]
    async fn test_schema_repository_registered_by_schema_name() {
        let registry = registry();
        let seo = Seo {
            system: article(9).system,
        };

        registry
            .register::<Seo>(EntityKind::ContentItem, Arc::new(FakeExecutor::returning(vec![seo])))
            .await
            .unwrap();
        registry
            .register::<LandingPage>(
                EntityKind::WebPage,
                Arc::new(FakeExecutor::returning(vec![landing_page(1, "/")])),
            )
            .await
            .unwrap();

        assert_eq!(registry.tags().await, vec!["Acme.LandingPage", "Acme.Seo"]);

        let repository = registry.get::<Seo>().await.unwrap();
        let items = repository
            .get_all_by_schema(&ReadOptions::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_reaches_registered_repositories() {
        let registry = registry();
        let executor = Arc::new(FakeExecutor::returning(vec![article(5)]));
        let repository = registry
            .register::<Article>(EntityKind::ContentItem, executor.clone())
            .await
            .unwrap();
        let cancel = CancellationToken::new();

        repository.get_by_id(5, &ReadOptions::new(), &cancel).await.unwrap();
        let evicted = registry
            .invalidate(&DependencyKey::content_item_by_id(5))
            .await
            .unwrap();
        repository.get_by_id(5, &ReadOptions::new(), &cancel).await.unwrap();

        assert_eq!(evicted, 1);
        assert_eq!(executor.calls(), 2);
    }
}
