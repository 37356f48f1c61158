//! Query domain - the read model handed to the execution engine

mod executor;
mod model;
mod scope;

pub use executor::{QueryExecutor, QueryOptions};
pub use model::{ContentQuery, CustomFilter, QueryFilter, QueryTarget};
pub use scope::{ScopeContext, ScopeProvider, StaticScopeProvider};

#[cfg(test)]
pub use scope::MockScopeProvider;
