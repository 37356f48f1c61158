//! Content Repository
//!
//! Typed, cached data access over a headless content store:
//! - Repositories reading content items and web pages by id, guid, path,
//!   custom filter or reusable schema
//! - A get-or-compute cache that runs at most one load per key
//! - Dependency keys discovered from results, so that changing an entity
//!   evicts exactly the results that contain it

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::cache::{Computed, ProgressiveCache};
pub use infrastructure::repository::{QueryRepository, RepositoryRegistry, RepositoryServices};
