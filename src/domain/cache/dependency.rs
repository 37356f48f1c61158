//! Dependency keys used to evict cache entries when entities change

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

const CONTENT_ITEM: &str = "contentitem";
const WEB_PAGE_ITEM: &str = "webpageitem";

/// A namespaced `{entityKind}|{selector}|{value}` tag
///
/// The emitted casing is preserved, equality and hashing ignore ASCII case.
#[derive(Debug, Clone, Eq)]
pub struct DependencyKey(String);

impl DependencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// `contentitem|byid|{id}`
    pub fn content_item_by_id(id: i32) -> Self {
        Self(format!("{CONTENT_ITEM}|byid|{id}"))
    }

    /// `contentitem|byguid|{guid}`
    pub fn content_item_by_guid(guid: Uuid) -> Self {
        Self(format!("{CONTENT_ITEM}|byguid|{guid}"))
    }

    /// `webpageitem|byid|{id}`
    pub fn web_page_by_id(id: i32) -> Self {
        Self(format!("{WEB_PAGE_ITEM}|byid|{id}"))
    }

    /// `webpageitem|byguid|{guid}`
    pub fn web_page_by_guid(guid: Uuid) -> Self {
        Self(format!("{WEB_PAGE_ITEM}|byguid|{guid}"))
    }

    /// `contentitem|bycontenttype|{typeName}`
    pub fn content_type(type_name: &str) -> Self {
        Self(format!("{CONTENT_ITEM}|bycontenttype|{type_name}"))
    }

    /// `webpageitem|bychannel|{channel}|bycontenttype|{typeName}`
    pub fn web_page_type_in_channel(channel: &str, type_name: &str) -> Self {
        Self(format!(
            "{WEB_PAGE_ITEM}|bychannel|{channel}|bycontenttype|{type_name}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DependencyKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Deduplicated, case-insensitive set of dependency keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyKeySet(HashSet<DependencyKey>);

impl DependencyKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal key (ignoring case) was already present
    pub fn insert(&mut self, key: DependencyKey) -> bool {
        self.0.insert(key)
    }

    pub fn extend(&mut self, other: DependencyKeySet) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyKey> {
        self.0.iter()
    }

    /// Keys in a stable (sorted, lowercase-insensitive) order for logging and storage
    pub fn to_sorted_vec(&self) -> Vec<DependencyKey> {
        let mut keys: Vec<DependencyKey> = self.0.iter().cloned().collect();
        keys.sort_by_key(|key| key.as_str().to_ascii_lowercase());
        keys
    }
}

impl FromIterator<DependencyKey> for DependencyKeySet {
    fn from_iter<I: IntoIterator<Item = DependencyKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DependencyKeySet {
    type Item = DependencyKey;
    type IntoIter = std::collections::hash_set::IntoIter<DependencyKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for DependencyKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .to_sorted_vec()
            .into_iter()
            .map(|key| key.0)
            .collect();
        write!(f, "[{}]", keys.join(", "))
    }
}
