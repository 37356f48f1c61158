//! Per-call cache policy

use std::time::Duration;

use crate::config::CacheSettings;

/// How long and under which conditions a computed value is remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub use_sliding_expiration: bool,
    pub skip_if_empty: bool,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            use_sliding_expiration: false,
            skip_if_empty: true,
        }
    }

    pub fn with_sliding_expiration(mut self, sliding: bool) -> Self {
        self.use_sliding_expiration = sliding;
        self
    }

    pub fn with_skip_if_empty(mut self, skip: bool) -> Self {
        self.skip_if_empty = skip;
        self
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheSettings::default())
    }
}

impl From<&CacheSettings> for CachePolicy {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            ttl: settings.ttl(),
            use_sliding_expiration: settings.use_sliding_expiration,
            skip_if_empty: settings.skip_if_empty,
        }
    }
}

/// Values whose emptiness decides `skip_if_empty`
pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}
