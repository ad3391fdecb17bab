//! Tree builder - construct a `Dom` from a JSON description
//!
//! This is not a markup parser. It takes an already structured description
//! (fixtures, snapshots, data handed over from a real parser) and turns it
//! into arena nodes through the normal attach path, so every tree it builds
//! satisfies the same invariants as one assembled by hand.
//!
//! Input format:
//! ```json
//! {
//!   "tag": "div",
//!   "attributes": { "id": "main" },
//!   "children": [ { "tag": "span" } ]
//! }
//! ```
//!
//! `attributes` may also be a flat `["key", "value", ...]` array.

use crate::arena::{Dom, DomConfig};
use crate::error::{DomError, Result};
use crate::types::{NodeId, Tag};
use serde_json::Value;

/// Builds trees into an owned arena
pub struct DomBuilder {
    dom: Dom,
}

impl DomBuilder {
    /// Create builder with default config
    pub fn new() -> Self {
        Self::with_config(DomConfig::default())
    }

    pub fn with_config(config: DomConfig) -> Self {
        Self {
            dom: Dom::with_config(config),
        }
    }

    /// One-shot: build a fresh arena from `description`
    pub fn build(description: &Value) -> Result<(Dom, NodeId)> {
        let mut builder = Self::new();
        let root = builder.add_tree(description)?;
        Ok((builder.into_dom(), root))
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn into_dom(self) -> Dom {
        self.dom
    }

    /// Add one more detached tree to the arena, returns its root.
    /// On error the arena is left as it was before the call.
    pub fn add_tree(&mut self, description: &Value) -> Result<NodeId> {
        let before = self.dom.len();
        match self.parse_node(description, None, 0) {
            Ok(root) => {
                tracing::debug!(root = %root, nodes = self.dom.len() - before, "built tree");
                Ok(root)
            }
            Err(err) => {
                // Nodes from this call only link to each other, so dropping
                // the tail of the arena removes them cleanly.
                let dropped = self.dom.len() - before;
                self.dom.truncate(before);
                tracing::debug!(dropped, error = %err, "discarded partial tree");
                Err(err)
            }
        }
    }

    fn parse_node(&mut self, value: &Value, parent: Option<NodeId>, depth: usize) -> Result<NodeId> {
        let limit = self.dom.config().max_depth;
        if depth > limit {
            return Err(DomError::DepthExceeded { limit });
        }

        let name = value
            .get("tag")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DomError::InvalidFixture(format!("missing 'tag' in {value}")))?;

        let tag = parse_attributes(Tag::new(name), value.get("attributes"))?;
        let id = self.dom.create_node(tag);

        if let Some(parent) = parent {
            self.dom.add_child(parent, id)?;
        }

        match value.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                for child in children {
                    self.parse_node(child, Some(id), depth + 1)?;
                }
            }
            Some(other) => {
                return Err(DomError::InvalidFixture(format!(
                    "'children' must be an array, got {other}"
                )))
            }
        }

        Ok(id)
    }
}

impl Default for DomBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_attributes(mut tag: Tag, attributes: Option<&Value>) -> Result<Tag> {
    match attributes {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (key, value) in map {
                tag = tag.with_attr(key.as_str(), attribute_value(value)?);
            }
        }
        // Flat [key, value, key, value] pairs
        Some(Value::Array(flat)) => {
            if flat.len() % 2 != 0 {
                return Err(DomError::InvalidFixture(
                    "attribute array must hold key/value pairs".to_string(),
                ));
            }
            for pair in flat.chunks(2) {
                let key = pair[0].as_str().ok_or_else(|| {
                    DomError::InvalidFixture(format!("attribute name must be a string: {}", pair[0]))
                })?;
                tag = tag.with_attr(key, attribute_value(&pair[1])?);
            }
        }
        Some(other) => {
            return Err(DomError::InvalidFixture(format!(
                "'attributes' must be an object or array, got {other}"
            )))
        }
    }
    Ok(tag)
}

fn attribute_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DomError::InvalidFixture(format!(
            "unsupported attribute value: {other}"
        ))),
    }
}
