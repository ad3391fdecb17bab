//! Sibling and ancestor navigation
//!
//! Everything here is read-only and walks parent links or the parent's
//! child list. Sibling lookups on a root fail with `NoParent`; running off
//! the end of a sibling list is `Ok(None)`, not an error.

use crate::arena::Dom;
use crate::error::{DomError, Result};
use crate::types::NodeId;

impl Dom {
    /// Sibling after `id` in document order
    pub fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let parent = self.get(id)?.parent.ok_or(DomError::NoParent(id))?;
        self.next_child(parent, id)
    }

    /// Sibling before `id` in document order
    pub fn previous_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let parent = self.get(id)?.parent.ok_or(DomError::NoParent(id))?;
        self.previous_child(parent, id)
    }

    /// Closest node named `tag`, starting with `id` itself and walking up
    pub fn ancestor_by_tag(&self, id: NodeId, tag: &str) -> Result<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if node.tag_name() == tag {
                return Ok(node_id);
            }
            current = node.parent;
        }

        Err(DomError::AncestorNotFound(tag.to_string()))
    }

    /// Parent chain above `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            current: self.get(id).ok().and_then(|node| node.parent),
        }
    }

    /// Top of the tree containing `id`
    pub fn root_of(&self, id: NodeId) -> Result<NodeId> {
        self.get(id)?;
        Ok(self.ancestors(id).last().unwrap_or(id))
    }

    /// Number of ancestors; roots are at depth 0
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        self.get(id)?;
        Ok(self.ancestors(id).count())
    }
}

/// Iterator produced by [`Dom::ancestors`]
pub struct Ancestors<'a> {
    dom: &'a Dom,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.dom.get(id).ok().and_then(|node| node.parent);
        Some(id)
    }
}
