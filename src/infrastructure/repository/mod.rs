//! Repository infrastructure - cached query repositories and their registry

mod query_repository;
mod registry;
mod services;

pub use query_repository::{QueryRepository, RepositoryItem};
pub use registry::RepositoryRegistry;
pub use services::RepositoryServices;
