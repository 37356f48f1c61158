//! Content domain - entity shapes and dependency discovery

mod extractor;
mod shape;

pub use extractor::DependencyKeyExtractor;
pub use shape::{
    ContentItemFields, ContentItemReference, DependencySource, Linked, WebPageFields,
    WebPageReference,
};
