//! In-memory document tree.

use std::collections::BTreeMap;

/// Attributes attached to an element node (name → value).
pub type Properties = BTreeMap<String, String>;

/// One node of a parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element with a tag name, attributes, and children
    Element(Element),

    /// A run of text
    Text(String),

    /// Raw markup passed through untouched by the serializer
    Raw(String),
}

/// An element node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercase tag name ("p", "img", ...)
    pub tag: String,

    /// Attributes in deterministic (sorted) order
    pub properties: Properties,

    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Attribute value, if present.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// A parsed document: an ordered forest of top-level nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    /// Top-level nodes in document order
    pub children: Vec<Node>,
}

impl DocumentTree {
    /// Build a tree from top-level nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}
