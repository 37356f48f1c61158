//! Type metadata - maps Rust types to content type and reusable schema names

mod resolver;

pub use resolver::{ContentTypeMarker, MetadataResolver, TypeNameCache};
