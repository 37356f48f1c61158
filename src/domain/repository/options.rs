use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::cache::DependencyKeySet;
use crate::domain::DomainError;

/// Kind of entity a repository reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ContentItem,
    WebPage,
}

impl EntityKind {
    /// Prefix shared by cache keys and dependency keys
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ContentItem => "contentitem",
            EntityKind::WebPage => "webpageitem",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call read options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Levels of linked items the executor loads; `None` uses the configured default
    pub linked_items_depth: Option<u32>,
    /// Replaces the discovered dependency keys
    pub dependency_keys: Option<DependencyKeySet>,
    /// Maximum number of items
    pub top: Option<usize>,
    /// Longest the caller waits; an expired wait fails as cancelled
    pub timeout: Option<Duration>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linked_items_depth(mut self, depth: u32) -> Self {
        self.linked_items_depth = Some(depth);
        self
    }

    pub fn with_dependency_keys(mut self, keys: DependencyKeySet) -> Self {
        self.dependency_keys = Some(keys);
        self
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.top == Some(0) {
            return Err(DomainError::validation("top must be greater than zero"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(DomainError::validation("timeout must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::DependencyKey;

    #[test]
    fn test_entity_kind_prefix() {
        assert_eq!(EntityKind::ContentItem.to_string(), "contentitem");
        assert_eq!(EntityKind::WebPage.to_string(), "webpageitem");
    }

    #[test]
    fn test_zero_top_rejected() {
        assert!(ReadOptions::new().with_top(0).validate().is_err());
        assert!(ReadOptions::new().with_top(5).validate().is_ok());
        assert!(ReadOptions::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(ReadOptions::new().with_timeout(Duration::ZERO).validate().is_err());
        assert!(ReadOptions::new()
            .with_timeout(Duration::from_millis(250))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_builder() {
        let keys: DependencyKeySet = std::iter::once(DependencyKey::content_type("Acme.Article")).collect();
        let options = ReadOptions::new()
            .with_linked_items_depth(1)
            .with_dependency_keys(keys.clone())
            .with_timeout(Duration::from_secs(2));

        assert_eq!(options.linked_items_depth, Some(1));
        assert_eq!(options.dependency_keys, Some(keys));
        assert_eq!(options.timeout, Some(Duration::from_secs(2)));
    }
}
