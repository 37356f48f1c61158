//! Infrastructure layer - cache stores, repositories and ambient services

pub mod cache;
pub mod logging;
pub mod observability;
pub mod repository;

pub use logging::init_logging;
