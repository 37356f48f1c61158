use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::ContentQuery;
use crate::domain::DomainError;

/// Execution flags derived from the caller's scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Read draft versions
    pub preview: bool,
    pub include_secured_items: bool,
    pub language: Option<String>,
}

/// Runs queries against the content store and maps rows to `T`
///
/// Implementations report failures as `DomainError::Upstream` and should
/// stop early once `cancel` fires.
#[async_trait]
pub trait QueryExecutor<T>: Send + Sync {
    async fn run(
        &self,
        query: &ContentQuery,
        options: &QueryOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<T>, DomainError>;
}
