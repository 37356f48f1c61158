//! Dependency key discovery over result graphs

use crate::domain::cache::{DependencyKey, DependencyKeySet};

use super::shape::{DependencySource, Linked};

/// Derives the dependency keys of query results
///
/// Each item contributes keys for its own shapes and for the shapes held by
/// its fields. Discovery stops there: an item linked from a field does not
/// contribute its own fields. Keys are deduplicated ignoring case.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyKeyExtractor;

impl DependencyKeyExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract<T: DependencySource>(&self, items: &[T]) -> DependencyKeySet {
        let mut keys = DependencyKeySet::new();
        for item in items {
            Self::collect(item, &mut keys);
        }
        keys
    }

    pub fn extract_one<T: DependencySource + ?Sized>(&self, item: &T) -> DependencyKeySet {
        let mut keys = DependencyKeySet::new();
        Self::collect(item, &mut keys);
        keys
    }

    fn collect<T: DependencySource + ?Sized>(item: &T, keys: &mut DependencyKeySet) {
        for linked in item.shapes().iter().chain(item.fields().iter()) {
            Self::emit(linked, keys);
        }
    }

    fn emit(linked: &Linked<'_>, keys: &mut DependencyKeySet) {
        match linked {
            Linked::ContentItem(item) => {
                keys.insert(DependencyKey::content_item_by_id(item.id));
            }
            Linked::WebPage(page) => {
                keys.insert(DependencyKey::web_page_by_id(page.id));
            }
            Linked::ContentReference(reference) => {
                keys.insert(DependencyKey::content_item_by_guid(reference.identifier));
            }
            Linked::WebPageReference(reference) => {
                keys.insert(DependencyKey::web_page_by_guid(reference.web_page_guid));
            }
            Linked::Many(members) => {
                for member in members {
                    Self::emit(member, keys);
                }
            }
        }
    }
}
