//! Core type definitions
//!
//! Key design principles:
//! 1. Use u32 for identities (4 bytes vs 8 bytes pointer)
//! 2. Parent links are plain indices, never owning pointers
//! 3. Tag data is read-only to the tree machinery

use crate::children::ChildCollection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Node identifier (index into arena)
///
/// Assigned once at creation, stable for the lifetime of the owning `Dom`.
/// u32 allows 4 billion nodes, enough for any document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Slot of this node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag name and attributes of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, used when constructing tags
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Whitespace separated entries of the `class` attribute
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::new(name)
    }
}

/// The main tree node structure
///
/// Design philosophy:
/// - Identity and navigation first
/// - Use indices instead of pointers
/// - The arena owns the node; `parent` is a non-owning back link
#[derive(Debug, Clone)]
pub struct DomNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: ChildCollection,
    pub(crate) tag: Tag,
}

impl DomNode {
    pub(crate) fn new(id: NodeId, tag: Tag) -> Self {
        Self {
            id,
            parent: None,
            children: ChildCollection::new(),
            tag,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &ChildCollection {
        &self.children
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn tag_name(&self) -> &str {
        self.tag.name()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.tag.attr(key)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
