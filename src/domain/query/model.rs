use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// What a query selects from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryTarget {
    /// Items of a single content type
    ContentType(String),
    /// Items of every content type implementing a reusable field schema
    ReusableSchema(String),
}

impl QueryTarget {
    pub fn name(&self) -> &str {
        match self {
            QueryTarget::ContentType(name) | QueryTarget::ReusableSchema(name) => name,
        }
    }
}

/// Caller supplied filter, opaque to this crate
///
/// `key` identifies the filter in cache keys; two filters with the same key
/// must select the same items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFilter {
    pub key: String,
    pub expression: serde_json::Value,
}

impl CustomFilter {
    pub fn new(key: impl Into<String>, expression: serde_json::Value) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::validation("Custom filter key cannot be empty"));
        }

        Ok(Self { key, expression })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryFilter {
    All,
    ByIds(Vec<i32>),
    ByGuids(Vec<Uuid>),
    ByPath(String),
    Custom(CustomFilter),
}

/// A read request against the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentQuery {
    pub target: QueryTarget,
    pub filter: QueryFilter,
    /// Website channel; web page queries only
    pub channel: Option<String>,
    pub language: Option<String>,
    pub linked_items_depth: u32,
    pub top: Option<usize>,
}

impl ContentQuery {
    pub fn new(target: QueryTarget) -> Self {
        Self {
            target,
            filter: QueryFilter::All,
            channel: None,
            language: None,
            linked_items_depth: 0,
            top: None,
        }
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_linked_items_depth(mut self, depth: u32) -> Self {
        self.linked_items_depth = depth;
        self
    }

    pub fn with_top(mut self, top: Option<usize>) -> Self {
        self.top = top;
        self
    }
}
