use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::ReadOptions;
use crate::domain::query::CustomFilter;
use crate::domain::DomainError;

/// Reads entities of the content type `T` declares
#[async_trait]
pub trait ContentRepository<T>: Send + Sync {
    async fn get_by_id(
        &self,
        id: i32,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError>;

    async fn get_by_ids(
        &self,
        ids: &[i32],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;

    async fn get_by_guid(
        &self,
        guid: Uuid,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError>;

    async fn get_by_guids(
        &self,
        guids: &[Uuid],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;

    async fn get_by_custom_filter(
        &self,
        filter: &CustomFilter,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;

    async fn get_all(
        &self,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;
}

/// Web page repository; pages are also addressable by tree path
#[async_trait]
pub trait PageRepository<T>: ContentRepository<T> {
    async fn get_by_path(
        &self,
        path: &str,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, DomainError>;
}

/// Reads items of every content type that implements the schema `T` declares
#[async_trait]
pub trait ReusableSchemaRepository<T>: Send + Sync {
    async fn get_all_by_schema(
        &self,
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;

    async fn get_by_schema_ids(
        &self,
        ids: &[i32],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;

    async fn get_by_schema_guids(
        &self,
        guids: &[Uuid],
        options: &ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, DomainError>;
}
