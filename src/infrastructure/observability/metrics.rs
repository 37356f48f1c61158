//! Cache and repository metrics
//!
//! Counters are emitted through the `metrics` facade; installing a recorder
//! (Prometheus or otherwise) is left to the host application.

use metrics::counter;

/// Why a computed value was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `skip_if_empty` and the value was empty
    EmptyValue,
    /// No dependency keys, so the entry could never be invalidated
    NoDependencies,
    /// A dependency was invalidated while the value was being computed
    Invalidated,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyValue => "empty_value",
            SkipReason::NoDependencies => "no_dependencies",
            SkipReason::Invalidated => "invalidated",
        }
    }
}

/// How a repository query was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Cached,
    Preview,
    Uncached,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Cached => "cached",
            QueryMode::Preview => "preview",
            QueryMode::Uncached => "uncached",
        }
    }
}

pub fn record_cache_hit() {
    counter!("content_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("content_cache_misses_total").increment(1);
}

pub fn record_cache_store() {
    counter!("content_cache_stores_total").increment(1);
}

pub fn record_cache_skip(reason: SkipReason) {
    counter!("content_cache_skipped_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_invalidation(evicted: usize) {
    counter!("content_cache_invalidations_total").increment(1);
    counter!("content_cache_evicted_entries_total").increment(evicted as u64);
}

pub fn record_repository_query(kind: &'static str, mode: QueryMode) {
    counter!(
        "content_repository_queries_total",
        "kind" => kind,
        "mode" => mode.as_str()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::EmptyValue.as_str(), "empty_value");
        assert_eq!(SkipReason::NoDependencies.as_str(), "no_dependencies");
        assert_eq!(SkipReason::Invalidated.as_str(), "invalidated");
    }

    #[test]
    fn test_query_mode_labels() {
        assert_eq!(QueryMode::Cached.as_str(), "cached");
        assert_eq!(QueryMode::Preview.as_str(), "preview");
        assert_eq!(QueryMode::Uncached.as_str(), "uncached");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cache_hit();
        record_cache_miss();
        record_cache_store();
        record_cache_skip(SkipReason::NoDependencies);
        record_invalidation(3);
        record_repository_query("contentitem", QueryMode::Cached);
    }
}
