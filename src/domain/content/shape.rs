//! Entity shapes recognised by dependency discovery

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// System fields carried by every content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemFields {
    pub id: i32,
    pub guid: Uuid,
    pub name: String,
    pub content_type_name: String,
    pub language: Option<String>,
}

/// System fields carried by every web page item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPageFields {
    pub id: i32,
    pub guid: Uuid,
    pub name: String,
    pub content_type_name: String,
    pub channel: String,
    pub tree_path: String,
    pub language: Option<String>,
}

/// Unresolved pointer to a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemReference {
    pub identifier: Uuid,
}

/// Unresolved pointer to a web page item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPageReference {
    pub web_page_guid: Uuid,
}

/// A shape exposed by a value or by one of its fields
///
/// The variants borrow leaf structs, so discovery never descends past one level.
#[derive(Debug, Clone, PartialEq)]
pub enum Linked<'a> {
    ContentItem(&'a ContentItemFields),
    WebPage(&'a WebPageFields),
    ContentReference(&'a ContentItemReference),
    WebPageReference(&'a WebPageReference),
    Many(Vec<Linked<'a>>),
}

impl<'a> Linked<'a> {
    /// Collects every shape in a field holding many items or references
    pub fn many<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Linked<'a>>,
    {
        Linked::Many(items.into_iter().collect())
    }
}

/// Values whose results can be cached against the entities they contain
///
/// `shapes` lists what the value itself is (a content item, a web page or
/// both); `fields` lists the items and references held by its fields.
/// Neither is followed further.
pub trait DependencySource {
    fn shapes(&self) -> Vec<Linked<'_>> {
        Vec::new()
    }

    fn fields(&self) -> Vec<Linked<'_>> {
        Vec::new()
    }
}

impl DependencySource for ContentItemFields {
    fn shapes(&self) -> Vec<Linked<'_>> {
        vec![Linked::ContentItem(self)]
    }
}

impl DependencySource for WebPageFields {
    fn shapes(&self) -> Vec<Linked<'_>> {
        vec![Linked::WebPage(self)]
    }
}

impl DependencySource for ContentItemReference {
    fn shapes(&self) -> Vec<Linked<'_>> {
        vec![Linked::ContentReference(self)]
    }
}

impl DependencySource for WebPageReference {
    fn shapes(&self) -> Vec<Linked<'_>> {
        vec![Linked::WebPageReference(self)]
    }
}

impl DependencySource for serde_json::Value {}
