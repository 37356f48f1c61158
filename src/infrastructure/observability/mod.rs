//! Observability infrastructure - cache and repository metrics

mod metrics;

pub use self::metrics::{
    record_cache_hit, record_cache_miss, record_cache_skip, record_cache_store,
    record_invalidation, record_repository_query, QueryMode, SkipReason,
};
