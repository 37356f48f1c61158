//! Repository domain - the typed read surface handed to application code

mod options;
mod traits;

pub use options::{EntityKind, ReadOptions};
pub use traits::{ContentRepository, PageRepository, ReusableSchemaRepository};
