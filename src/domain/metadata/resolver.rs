use std::any::type_name;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::domain::lock::{rw_read, rw_write};
use crate::domain::DomainError;

const SOURCE: &str = "metadata::resolver";

/// Declares the CMS identifiers a Rust type maps to
///
/// Both default to `None`; a type implements the one(s) it represents.
pub trait ContentTypeMarker: 'static {
    /// Code name of the content type, e.g. `Acme.Article`
    fn content_type_name() -> Option<&'static str> {
        None
    }

    /// Code name of the reusable field schema, e.g. `Acme.Seo`
    fn reusable_schema_name() -> Option<&'static str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NameKind {
    ContentType,
    ReusableSchema,
}

/// Write-once memo of resolved identifiers, shared between resolvers
#[derive(Debug, Clone, Default)]
pub struct TypeNameCache {
    names: Arc<RwLock<HashMap<(NameKind, &'static str), String>>>,
}

impl TypeNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.names, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_resolve(
        &self,
        kind: NameKind,
        rust_type: &'static str,
        lookup: impl FnOnce() -> Option<&'static str>,
    ) -> Option<String> {
        let key = (kind, rust_type);

        if let Some(name) = rw_read(&self.names, SOURCE, "get").get(&key) {
            return Some(name.clone());
        }

        // Racing resolutions may all look up; they yield the same name and
        // the first insert wins.
        let name = lookup().map(str::trim).filter(|name| !name.is_empty())?;

        let mut names = rw_write(&self.names, SOURCE, "resolve");
        let resolved = names.entry(key).or_insert_with(|| {
            debug!(rust_type, content_type = name, ?kind, "Resolved type identifier");
            name.to_string()
        });
        Some(resolved.clone())
    }
}

/// Resolves and memoizes the identifiers declared by `ContentTypeMarker`
#[derive(Debug, Clone, Default)]
pub struct MetadataResolver {
    cache: TypeNameCache,
}

impl MetadataResolver {
    pub fn new(cache: TypeNameCache) -> Self {
        Self { cache }
    }

    /// Content type name of `T`, `None` when `T` declares none
    pub fn content_type_name<T: ContentTypeMarker>(&self) -> Option<String> {
        self.cache.get_or_resolve(
            NameKind::ContentType,
            type_name::<T>(),
            T::content_type_name,
        )
    }

    /// Reusable schema name of `T`, `None` when `T` declares none
    pub fn reusable_schema_name<T: ContentTypeMarker>(&self) -> Option<String> {
        self.cache.get_or_resolve(
            NameKind::ReusableSchema,
            type_name::<T>(),
            T::reusable_schema_name,
        )
    }

    pub fn require_content_type_name<T: ContentTypeMarker>(&self) -> Result<String, DomainError> {
        self.content_type_name::<T>().ok_or_else(|| {
            DomainError::configuration(format!(
                "Type '{}' does not declare a content type name",
                type_name::<T>()
            ))
        })
    }

    pub fn require_reusable_schema_name<T: ContentTypeMarker>(
        &self,
    ) -> Result<String, DomainError> {
        self.reusable_schema_name::<T>().ok_or_else(|| {
            DomainError::configuration(format!(
                "Type '{}' does not declare a reusable schema name",
                type_name::<T>()
            ))
        })
    }

    pub fn cache(&self) -> &TypeNameCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Article;

    impl ContentTypeMarker for Article {
        fn content_type_name() -> Option<&'static str> {
            Some("Acme.Article")
        }
    }

    struct Seo;

    impl ContentTypeMarker for Seo {
        fn reusable_schema_name() -> Option<&'static str> {
            Some("Acme.Seo")
        }
    }

    struct Blank;

    impl ContentTypeMarker for Blank {
        fn content_type_name() -> Option<&'static str> {
            Some("   ")
        }
    }

    static COUNTED_LOOKUPS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl ContentTypeMarker for Counted {
        fn content_type_name() -> Option<&'static str> {
            COUNTED_LOOKUPS.fetch_add(1, Ordering::SeqCst);
            Some("Acme.Counted")
        }
    }

    static MISSING_LOOKUPS: AtomicUsize = AtomicUsize::new(0);

    struct Unmarked;

    impl ContentTypeMarker for Unmarked {
        fn content_type_name() -> Option<&'static str> {
            MISSING_LOOKUPS.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    #[test]
    fn test_resolves_content_type_name() {
        let resolver = MetadataResolver::default();

        assert_eq!(
            resolver.content_type_name::<Article>().as_deref(),
            Some("Acme.Article")
        );
        assert!(resolver.reusable_schema_name::<Article>().is_none());
    }

    #[test]
    fn test_resolves_reusable_schema_name() {
        let resolver = MetadataResolver::default();

        assert_eq!(
            resolver.reusable_schema_name::<Seo>().as_deref(),
            Some("Acme.Seo")
        );
        assert!(resolver.content_type_name::<Seo>().is_none());
    }

    #[test]
    fn test_blank_name_is_not_cached() {
        let resolver = MetadataResolver::default();

        assert!(resolver.content_type_name::<Blank>().is_none());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_missing_name_is_looked_up_again() {
        let resolver = MetadataResolver::default();

        assert!(resolver.content_type_name::<Unmarked>().is_none());
        assert!(resolver.content_type_name::<Unmarked>().is_none());
        assert_eq!(MISSING_LOOKUPS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_require_reports_configuration_error() {
        let resolver = MetadataResolver::default();

        let error = resolver.require_content_type_name::<Seo>().unwrap_err();
        assert!(matches!(error, DomainError::Configuration { .. }));
        assert!(resolver.require_reusable_schema_name::<Article>().is_err());
        assert_eq!(resolver.require_content_type_name::<Article>().unwrap(), "Acme.Article");
    }

    #[test]
    fn test_shared_cache_between_resolvers() {
        let cache = TypeNameCache::new();
        let first = MetadataResolver::new(cache.clone());
        let second = MetadataResolver::new(cache.clone());

        first.content_type_name::<Article>();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            second.content_type_name::<Article>().as_deref(),
            Some("Acme.Article")
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_resolution_is_memoized() {
        let resolver = MetadataResolver::default();
        let mut handles = Vec::new();

        for _ in 0..1000 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver.content_type_name::<Counted>()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().as_deref(), Some("Acme.Counted"));
        }

        // only resolutions racing the first insert look up, at most one per worker
        let lookups = COUNTED_LOOKUPS.load(Ordering::SeqCst);
        assert!((1..=8).contains(&lookups), "lookups = {lookups}");

        resolver.content_type_name::<Counted>();
        assert_eq!(COUNTED_LOOKUPS.load(Ordering::SeqCst), lookups);
        assert_eq!(resolver.cache().len(), 1);
    }
}
