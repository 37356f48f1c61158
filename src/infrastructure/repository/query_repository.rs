//! Cached query repository
//!
//! Every read resolves the type identifier first, so a misconfigured type
//! fails before any I/O. Live reads go through `ProgressiveCache`; preview
//! reads, and all reads while caching is disabled, go straight to the
//! executor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::RepositoryServices;
use crate::domain::cache::{CacheKey, CacheKeyBuilder, CachePolicy, DependencyKey, KeyPart};
use crate::domain::content::{DependencyKeyExtractor, DependencySource};
use crate::domain::metadata::ContentTypeMarker;
use crate::domain::query::{
    ContentQuery, CustomFilter, QueryExecutor, QueryFilter, QueryOptions, QueryTarget,
};
use crate::domain::repository::{
    ContentRepository, EntityKind, PageRepository, ReadOptions, ReusableSchemaRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::cache::Computed;
use crate::infrastructure::observability::{record_repository_query, QueryMode};

/// Types a `QueryRepository` can read and cache
pub trait RepositoryItem:
    ContentTypeMarker + DependencySource + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> RepositoryItem for T where
    T: ContentTypeMarker + DependencySource + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// One read: what to query and how it is named in the cache
struct Fetch {
    target: QueryTarget,
    filter: QueryFilter,
    operation: &'static str,
    args: Vec<KeyPart>,
    /// Listings also depend on the type so that new items evict them
    listing: bool,
}

impl Fetch {
    fn new(target: QueryTarget, filter: QueryFilter, operation: &'static str) -> Self {
        Self {
            target,
            filter,
            operation,
            args: Vec::new(),
            listing: false,
        }
    }

    fn arg(mut self, arg: impl Into<KeyPart>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn listing(mut self) -> Self {
        self.listing = true;
        self
    }
}

/// Generic repository over a `QueryExecutor`
pub struct QueryRepository<T> {
    kind: EntityKind,
    executor: Arc<dyn QueryExecutor<T>>,
    services: Arc<RepositoryServices>,
    extractor: DependencyKeyExtractor,
}

impl<T> std::fmt::Debug for QueryRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRepository")
            .field("kind", &self.kind)
            .field("item", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: RepositoryItem> QueryRepository<T> {
    pub fn new(
        kind: EntityKind,
        executor: Arc<dyn QueryExecutor<T>>,
        services: Arc<RepositoryServices>,
    ) -> Self {
        Self {
            kind,
            executor,
            services,
            extractor: DependencyKeyExtractor::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn services(&self) -> &Arc<RepositoryServices> {
        &self.services
    }

    fn content_type(&self) -> Result<QueryTarget, DomainError> {
        self.services
            .metadata
            .require_content_type_name::<T>()
            .map(QueryTarget::ContentType)
    }

    fn reusable_schema(&self) -> Result<QueryTarget, DomainError> {
        self.services
            .metadata
            .require_reusable_schema_name::<T>()
            .map(QueryTarget::ReusableSchema)
    }

    async fn fetch(
        &self,
        fetch: Fetch,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let Fetch {
            target,
            filter,
            operation,
            args,
            listing,
        } = fetch;

        let scope = self.services.scope.current();
        let defaults = &self.services.repository_settings;

        let channel = match self.kind {
            EntityKind::WebPage => scope.channel.or_else(|| defaults.default_channel.clone()),
            EntityKind::ContentItem => None,
        };
        let language = scope.language.or_else(|| defaults.default_language.clone());
        let depth = options
            .linked_items_depth
            .unwrap_or(defaults.default_linked_items_depth);

        let query = ContentQuery::new(target)
            .with_filter(filter)
            .with_channel(channel)
            .with_language(language.clone())
            .with_linked_items_depth(depth)
            .with_top(options.top);
        let query_options = QueryOptions {
            preview: scope.preview,
            include_secured_items: false,
            language,
        };

        if scope.preview || !self.services.cache_settings.is_active() {
            let mode = if scope.preview {
                QueryMode::Preview
            } else {
                QueryMode::Uncached
            };
            record_repository_query(self.kind.as_str(), mode);
            debug!(
                kind = %self.kind,
                content_type = query.target.name(),
                operation,
                mode = mode.as_str(),
                "Executing query without cache"
            );
            return self
                .run_uncached(&query, &query_options, options.timeout, cancel)
                .await;
        }

        record_repository_query(self.kind.as_str(), QueryMode::Cached);

        let key = self.cache_key(&query, operation, args);
        let policy = CachePolicy::from(&self.services.cache_settings);
        let explicit = options.dependency_keys.clone();
        let collection = if listing {
            self.collection_key(&query)
        } else {
            None
        };
        let executor = self.executor.clone();
        let extractor = self.extractor;

        let compute = move |token: CancellationToken| async move {
            let items = executor.run(&query, &query_options, token).await?;

            let dependencies = match explicit {
                Some(keys) => keys,
                None => {
                    let mut keys = extractor.extract(&items);
                    if let Some(key) = collection {
                        keys.insert(key);
                    }
                    keys
                }
            };

            Ok::<_, DomainError>(Computed::new(items, dependencies))
        };

        self.services
            .cache
            .load_or_compute_with_timeout(&key, &policy, cancel, options.timeout, compute)
            .await
    }

    async fn run_uncached(
        &self,
        query: &ContentQuery,
        options: &QueryOptions,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let run = self.executor.run(query, options, cancel.clone());
        let Some(timeout) = timeout else {
            return tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(cancelled(query)),
                result = run => result,
            };
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled(query)),
            _ = tokio::time::sleep(timeout) => Err(DomainError::cancelled(format!(
                "Query for '{}' timed out",
                query.target.name()
            ))),
            result = run => result,
        }
    }

    /// `{kind}|{type}|{channel}|{language}|{operation}|{args}_{depth}_{top}`
    fn cache_key(&self, query: &ContentQuery, operation: &str, args: Vec<KeyPart>) -> CacheKey {
        let builder = args.into_iter().fold(
            CacheKeyBuilder::new(self.kind.as_str())
                .scope(query.target.name())
                .scope(optional(query.channel.as_deref()))
                .scope(optional(query.language.as_deref()))
                .operation(operation),
            |builder, arg| builder.arg(arg),
        );

        builder
            .arg(query.linked_items_depth)
            .arg(query.top.map(KeyPart::from).unwrap_or_else(KeyPart::empty))
            .build()
    }

    fn collection_key(&self, query: &ContentQuery) -> Option<DependencyKey> {
        let QueryTarget::ContentType(type_name) = &query.target else {
            return None;
        };

        match self.kind {
            EntityKind::ContentItem => Some(DependencyKey::content_type(type_name)),
            EntityKind::WebPage => query
                .channel
                .as_deref()
                .map(|channel| DependencyKey::web_page_type_in_channel(channel, type_name)),
        }
    }
}

fn cancelled(query: &ContentQuery) -> DomainError {
    DomainError::cancelled(format!("Query for '{}' cancelled", query.target.name()))
}

fn optional(value: Option<&str>) -> KeyPart {
    value.map(KeyPart::from).unwrap_or_else(KeyPart::empty)
}

#[async_trait]
impl<T: RepositoryItem> ContentRepository<T> for QueryRepository<T> {
    async fn get_by_id(
        &self,
        id: i32,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        let fetch = Fetch::new(target, QueryFilter::ByIds(vec![id]), "byid").arg(id);
        Ok(self.fetch(fetch, options, cancel).await?.into_iter().next())
    }

    async fn get_by_ids(
        &self,
        ids: &[i32],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch = Fetch::new(target, QueryFilter::ByIds(ids.to_vec()), "byids").arg(ids);
        self.fetch(fetch, options, cancel).await
    }

    async fn get_by_guid(
        &self,
        guid: Uuid,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        let fetch = Fetch::new(target, QueryFilter::ByGuids(vec![guid]), "byguid").arg(guid);
        Ok(self.fetch(fetch, options, cancel).await?.into_iter().next())
    }

    async fn get_by_guids(
        &self,
        guids: &[Uuid],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        if guids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch =
            Fetch::new(target, QueryFilter::ByGuids(guids.to_vec()), "byguids").arg(guids);
        self.fetch(fetch, options, cancel).await
    }

    async fn get_by_custom_filter(
        &self,
        filter: &CustomFilter,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        if filter.key.trim().is_empty() {
            return Err(DomainError::validation("Custom filter key cannot be empty"));
        }

        let fetch = Fetch::new(target, QueryFilter::Custom(filter.clone()), "bycustom")
            .arg(filter.key.as_str())
            .listing();
        self.fetch(fetch, options, cancel).await
    }

    async fn get_all(
        &self,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        let fetch = Fetch::new(target, QueryFilter::All, "all").listing();
        self.fetch(fetch, options, cancel).await
    }
}

#[async_trait]
impl<T: RepositoryItem> PageRepository<T> for QueryRepository<T> {
    async fn get_by_path(
        &self,
        path: &str,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError> {
        let target = self.content_type()?;
        options.validate()?;

        if self.kind != EntityKind::WebPage {
            return Err(DomainError::configuration(format!(
                "Repository for '{}' reads content items, which have no path",
                target.name()
            )));
        }
        if path.trim().is_empty() {
            return Err(DomainError::validation("Path cannot be empty"));
        }

        let fetch = Fetch::new(target, QueryFilter::ByPath(path.to_string()), "bypath")
            .arg(path)
            .listing();
        Ok(self.fetch(fetch, options, cancel).await?.into_iter().next())
    }
}

#[async_trait]
impl<T: RepositoryItem> ReusableSchemaRepository<T> for QueryRepository<T> {
    async fn get_all_by_schema(
        &self,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.reusable_schema()?;
        options.validate()?;

        let fetch = Fetch::new(target, QueryFilter::All, "schema_all").listing();
        self.fetch(fetch, options, cancel).await
    }

    async fn get_by_schema_ids(
        &self,
        ids: &[i32],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.reusable_schema()?;
        options.validate()?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch = Fetch::new(target, QueryFilter::ByIds(ids.to_vec()), "schema_byids").arg(ids);
        self.fetch(fetch, options, cancel).await
    }

    async fn get_by_schema_guids(
        &self,
        guids: &[Uuid],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError> {
        let target = self.reusable_schema()?;
        options.validate()?;

        if guids.is_empty() {
            return Ok(Vec::new());
        }

        let fetch =
            Fetch::new(target, QueryFilter::ByGuids(guids.to_vec()), "schema_byguids").arg(guids);
        self.fetch(fetch, options, cancel).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for repository tests

    use super::*;
    use crate::config::{CacheSettings, RepositorySettings};
    use crate::domain::content::{ContentItemFields, Linked, WebPageFields};
    use crate::domain::metadata::MetadataResolver;
    use crate::domain::query::{ScopeContext, ScopeProvider, StaticScopeProvider};
    use crate::infrastructure::cache::{InMemoryCacheStore, ProgressiveCache};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Article {
        pub system: ContentItemFields,
        pub title: String,
    }

    impl ContentTypeMarker for Article {
        fn content_type_name() -> Option<&'static str> {
            Some("Acme.Article")
        }
    }

    impl DependencySource for Article {
        fn shapes(&self) -> Vec<Linked<'_>> {
            vec![Linked::ContentItem(&self.system)]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LandingPage {
        pub page: WebPageFields,
    }

    impl ContentTypeMarker for LandingPage {
        fn content_type_name() -> Option<&'static str> {
            Some("Acme.LandingPage")
        }
    }

    impl DependencySource for LandingPage {
        fn shapes(&self) -> Vec<Linked<'_>> {
            vec![Linked::WebPage(&self.page)]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Seo {
        pub system: ContentItemFields,
    }

    impl ContentTypeMarker for Seo {
        fn reusable_schema_name() -> Option<&'static str> {
            Some("Acme.Seo")
        }
    }

    impl DependencySource for Seo {
        fn shapes(&self) -> Vec<Linked<'_>> {
            vec![Linked::ContentItem(&self.system)]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Unmarked {
        pub id: i32,
    }

    impl ContentTypeMarker for Unmarked {}
    impl DependencySource for Unmarked {}

    pub fn article(id: i32) -> Article {
        Article {
            system: ContentItemFields {
                id,
                guid: Uuid::new_v4(),
                name: format!("article-{id}"),
                content_type_name: "Acme.Article".to_string(),
                language: None,
            },
            title: format!("Article {id}"),
        }
    }

    pub fn landing_page(id: i32, path: &str) -> LandingPage {
        LandingPage {
            page: WebPageFields {
                id,
                guid: Uuid::new_v4(),
                name: format!("page-{id}"),
                content_type_name: "Acme.LandingPage".to_string(),
                channel: "website".to_string(),
                tree_path: path.to_string(),
                language: None,
            },
        }
    }

    /// Executor returning fixed items, counting calls and recording queries
    pub struct FakeExecutor<T> {
        items: Mutex<Vec<T>>,
        error: Option<DomainError>,
        delay: Duration,
        calls: AtomicUsize,
        queries: Mutex<Vec<(ContentQuery, QueryOptions)>>,
    }

    impl<T: Clone> FakeExecutor<T> {
        pub fn returning(items: Vec<T>) -> Self {
            Self {
                items: Mutex::new(items),
                error: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: DomainError) -> Self {
            Self {
                error: Some(error),
                ..Self::returning(Vec::new())
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn set_items(&self, items: Vec<T>) {
            *self.items.lock().unwrap() = items;
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_query(&self) -> Option<(ContentQuery, QueryOptions)> {
            self.queries.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync> QueryExecutor<T> for FakeExecutor<T> {
        async fn run(
            &self,
            query: &ContentQuery,
            options: &QueryOptions,
            _cancel: CancellationToken,
        ) -> Result<Vec<T>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries
                .lock()
                .unwrap()
                .push((query.clone(), options.clone()));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(self.items.lock().unwrap().clone()),
            }
        }
    }

    pub fn services_with_scope(
        scope: Arc<dyn ScopeProvider>,
        settings: CacheSettings,
    ) -> Arc<RepositoryServices> {
        Arc::new(RepositoryServices::new(
            Arc::new(ProgressiveCache::new(Arc::new(InMemoryCacheStore::new()))),
            MetadataResolver::default(),
            scope,
            settings,
            RepositorySettings::default(),
        ))
    }

    pub fn services(scope: ScopeContext) -> Arc<RepositoryServices> {
        services_with_scope(
            Arc::new(StaticScopeProvider::new(scope)),
            CacheSettings::default(),
        )
    }
}
