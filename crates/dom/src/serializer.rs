//! Tree serializer - explicit markup accessors
//!
//! This module handles:
//! - Outer / inner markup of a node's subtree
//! - XPath generation for node identification
//! - Structured snapshots (serde) for fixtures and debugging
//!
//! Nodes carry only tags, so the output is element markup. Text content is
//! the business of whatever builds the tree.

use crate::arena::Dom;
use crate::error::{DomError, Result};
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default tags rendered without a closing tag
pub const DEFAULT_VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    pub void_tags: Vec<String>,
    /// One node per line, two spaces per level
    pub pretty: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            void_tags: DEFAULT_VOID_TAGS.iter().map(|s| s.to_string()).collect(),
            pretty: false,
        }
    }
}

/// Structured copy of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

/// Tree serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Markup of the node itself and everything below it
    pub fn outer_html(&self, dom: &Dom, id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        self.serialize_node(dom, id, 0, &mut output)?;
        Ok(output)
    }

    /// Markup of the node's children, without the node's own tag
    pub fn inner_html(&self, dom: &Dom, id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        for child in dom.get(id)?.children().iter() {
            self.serialize_node(dom, child, 0, &mut output)?;
        }
        Ok(output)
    }

    fn is_void(&self, tag: &str) -> bool {
        self.config
            .void_tags
            .iter()
            .any(|void| void.eq_ignore_ascii_case(tag))
    }

    /// Serialize a single node recursively
    fn serialize_node(&self, dom: &Dom, id: NodeId, depth: usize, output: &mut String) -> Result<()> {
        let limit = dom.config().max_depth;
        if depth > limit {
            return Err(DomError::DepthExceeded { limit });
        }

        let node = dom.get(id)?;
        let indent = if self.config.pretty {
            "  ".repeat(depth)
        } else {
            String::new()
        };

        // Format: <tag a="1" b="2">, attributes sorted for stable output
        output.push_str(&indent);
        output.push('<');
        output.push_str(node.tag_name());

        let mut attributes: Vec<_> = node.tag().attributes().iter().collect();
        attributes.sort();
        for (name, value) in attributes {
            output.push(' ');
            output.push_str(name);
            output.push_str("=\"");
            escape_into(value, output);
            output.push('"');
        }
        output.push('>');

        if self.is_void(node.tag_name()) {
            if self.config.pretty {
                output.push('\n');
            }
            return Ok(());
        }

        if self.config.pretty && node.has_children() {
            output.push('\n');
        }

        for child in node.children().iter() {
            self.serialize_node(dom, child, depth + 1, output)?;
        }

        if self.config.pretty && node.has_children() {
            output.push_str(&indent);
        }
        output.push_str("</");
        output.push_str(node.tag_name());
        output.push('>');
        if self.config.pretty {
            output.push('\n');
        }

        Ok(())
    }

    /// Generate XPath for a node, e.g. `/html[1]/body[1]/div[2]`
    pub fn xpath(&self, dom: &Dom, id: NodeId) -> Result<String> {
        let mut path_parts = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            let node = dom.get(node_id)?;

            // Position among siblings with the same tag name, case-insensitive
            // to match the lowercased step name
            let position = match node.parent() {
                Some(parent_id) => dom
                    .get(parent_id)?
                    .children()
                    .iter()
                    .filter_map(|child| dom.get(child).ok())
                    .filter(|child| child.tag_name().eq_ignore_ascii_case(node.tag_name()))
                    .position(|child| child.id() == node_id)
                    .map(|p| p + 1) // XPath is 1-indexed
                    .unwrap_or(1),
                None => 1,
            };

            path_parts.push(format!("{}[{}]", node.tag_name().to_lowercase(), position));
            current = node.parent();
        }

        path_parts.reverse();
        Ok(format!("/{}", path_parts.join("/")))
    }

    /// Structured copy of the subtree rooted at `id`
    pub fn snapshot(&self, dom: &Dom, id: NodeId) -> Result<NodeSnapshot> {
        self.snapshot_node(dom, id, 0)
    }

    fn snapshot_node(&self, dom: &Dom, id: NodeId, depth: usize) -> Result<NodeSnapshot> {
        let limit = dom.config().max_depth;
        if depth > limit {
            return Err(DomError::DepthExceeded { limit });
        }

        let node = dom.get(id)?;
        let children = node
            .children()
            .iter()
            .map(|child| self.snapshot_node(dom, child, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(NodeSnapshot {
            id,
            tag: node.tag_name().to_string(),
            attributes: node
                .tag()
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            children,
        })
    }

    /// Snapshot rendered as JSON
    pub fn to_json(&self, dom: &Dom, id: NodeId) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot(dom, id)?)?)
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_into(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
}
