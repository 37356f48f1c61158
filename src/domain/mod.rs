//! Domain layer - cache kernel, content shapes and repository ports

pub mod cache;
pub mod content;
pub mod error;
pub(crate) mod lock;
pub mod metadata;
pub mod query;
pub mod repository;

pub use cache::{
    CacheKey, CacheKeyBuilder, CachePolicy, CacheStore, CacheStoreExt, DependencyKey,
    DependencyKeySet, EntryOptions, IsEmpty, KeyPart,
};
pub use content::{DependencyKeyExtractor, DependencySource, Linked};
pub use error::DomainError;
pub use metadata::{ContentTypeMarker, MetadataResolver, TypeNameCache};
pub use query::{
    ContentQuery, CustomFilter, QueryExecutor, QueryFilter, QueryOptions, QueryTarget,
    ScopeContext, ScopeProvider, StaticScopeProvider,
};
pub use repository::{
    ContentRepository, EntityKind, PageRepository, ReadOptions, ReusableSchemaRepository,
};
