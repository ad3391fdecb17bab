//! Arena-based tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! The arena owns every node. Parent and child links are indices into it, so
//! there are no reference cycles to break and no teardown step: dropping the
//! `Dom` drops the whole tree.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ NodeId is the slot index, assigned once, never reused
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, Tag};
use smallvec::SmallVec;

/// Configuration for a tree arena
#[derive(Debug, Clone)]
pub struct DomConfig {
    /// Node slots reserved up front
    pub initial_capacity: usize,
    /// Recursion limit for the serializer and builder, which walk the
    /// tree recursively. Iterative walks in this module are not capped.
    pub max_depth: usize,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024, // Pre-allocate for typical page
            max_depth: 4096,
        }
    }
}

/// Arena holding one or more trees of nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation
/// - NodeId is the index into that Vec
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<DomNode>,
    config: DomConfig,
}

impl Dom {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_config(DomConfig::default())
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(DomConfig {
            initial_capacity: capacity,
            ..DomConfig::default()
        })
    }

    pub fn with_config(config: DomConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(config.initial_capacity),
            config,
        }
    }

    pub fn config(&self) -> &DomConfig {
        &self.config
    }

    /// Create a detached node: fresh id, no parent, no children
    pub fn create_node(&mut self, tag: impl Into<Tag>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(DomNode::new(id, tag.into()));
        tracing::trace!(node = %id, "created node");
        id
    }

    /// Node behind `id`, `NodeNotFound` for ids this arena never issued
    pub fn get(&self, id: NodeId) -> Result<&DomNode> {
        self.nodes.get(id.index()).ok_or(DomError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(DomError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop nodes created at or after slot `len`.
    ///
    /// Only sound when no node below `len` links to a dropped one, which
    /// holds for a batch of nodes that were attached only to each other.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn tag(&self, id: NodeId) -> Result<&Tag> {
        Ok(&self.get(id)?.tag)
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Result<Option<&str>> {
        Ok(self.get(id)?.tag.attr(key))
    }

    pub fn attributes(&self, id: NodeId) -> Result<&std::collections::HashMap<String, String>> {
        Ok(self.get(id)?.tag.attributes())
    }

    pub fn get_parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn has_children(&self, id: NodeId) -> Result<bool> {
        Ok(self.get(id)?.has_children())
    }

    /// Direct children in document order
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(id)?.children.iter().collect())
    }

    /// Look up `child` among the direct children of `parent`
    pub fn get_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        if self.get(parent)?.children.contains(child) {
            Ok(child)
        } else {
            Err(DomError::ChildNotFound { parent, child })
        }
    }

    /// Child after `child` in `parent`, `None` if `child` is the last one
    pub fn next_child(&self, parent: NodeId, child: NodeId) -> Result<Option<NodeId>> {
        self.get(parent)?
            .children
            .next_of(child)
            .ok_or(DomError::ChildNotFound { parent, child })
    }

    /// Child before `child` in `parent`, `None` if `child` is the first one
    pub fn previous_child(&self, parent: NodeId, child: NodeId) -> Result<Option<NodeId>> {
        self.get(parent)?
            .children
            .prev_of(child)
            .ok_or(DomError::ChildNotFound { parent, child })
    }

    pub fn first_child(&self, id: NodeId) -> Result<NodeId> {
        self.get(id)?
            .children
            .first()
            .ok_or(DomError::EmptyCollection(id))
    }

    pub fn last_child(&self, id: NodeId) -> Result<NodeId> {
        self.get(id)?
            .children
            .last()
            .ok_or(DomError::EmptyCollection(id))
    }

    /// Append `child` to `parent`, moving it from its old parent if needed.
    ///
    /// Returns false when `child` is already a child of `parent`; order is
    /// left as it was.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool> {
        self.reparent(child, parent)
    }

    /// Make `parent` the parent of `node`. Same protocol as [`Dom::add_child`].
    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<bool> {
        self.reparent(node, parent)
    }

    /// Remove `child` from `parent` and clear its parent link.
    /// Ids that are not children of `parent` are ignored.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.get_mut(parent)?.children.remove(child).is_none() {
            return Ok(());
        }
        if let Ok(node) = self.get_mut(child) {
            node.parent = None;
        }
        tracing::trace!(parent = %parent, child = %child, "removed child");
        Ok(())
    }

    /// Detach `id` from its parent. No-op for roots.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        match self.get(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Move `node` under `new_parent` in one step.
    ///
    /// All checks run before anything is touched, so a failed call leaves
    /// both trees as they were.
    fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<bool> {
        let old_parent = self.get(node)?.parent;
        self.get(new_parent)?;

        if node == new_parent {
            tracing::debug!(node = %node, "rejected self-referencing attach");
            return Err(DomError::SelfReference(node));
        }
        if old_parent == Some(new_parent) {
            return Ok(false);
        }
        if self.is_ancestor_or_self(node, new_parent)? {
            tracing::debug!(node = %node, parent = %new_parent, "rejected attach below own descendant");
            return Err(DomError::HierarchyCycle {
                node,
                parent: new_parent,
            });
        }

        if let Some(old) = old_parent {
            self.get_mut(old)?.children.remove(node);
        }
        self.get_mut(node)?.parent = Some(new_parent);
        self.get_mut(new_parent)?.children.push_back(node);

        tracing::trace!(node = %node, from = ?old_parent, to = %new_parent, "reparented");
        Ok(true)
    }

    /// Whether `ancestor` is `id` or lies on the parent chain above it
    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > self.nodes.len() {
                return Err(DomError::DepthExceeded {
                    limit: self.nodes.len(),
                });
            }
            current = self.get(node)?.parent;
        }
        Ok(false)
    }

    /// Whether `id` appears anywhere below `root` (not counting `root`)
    pub fn is_descendant(&self, root: NodeId, id: NodeId) -> Result<bool> {
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(root);
        let mut visited = 0;

        while let Some(current) = stack.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                return Err(DomError::DepthExceeded {
                    limit: self.nodes.len(),
                });
            }
            for child in self.get(current)?.children.iter() {
                if child == id {
                    return Ok(true);
                }
                stack.push(child);
            }
        }

        Ok(false)
    }

    /// Visit `start` and everything below it in document order.
    /// Uses an explicit stack, so depth only costs heap.
    pub fn traverse_df<F>(&self, start: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack: SmallVec<[NodeId; 16]> = SmallVec::new();
        stack.push(start);
        let mut visited = 0;

        while let Some(id) = stack.pop() {
            // A walk longer than the arena means the links loop
            visited += 1;
            if visited > self.nodes.len() {
                return Err(DomError::DepthExceeded {
                    limit: self.nodes.len(),
                });
            }
            let node = self.get(id)?;
            visit(node)?;

            // Reverse push so children pop left-to-right
            for child in node.children.iter_rev() {
                stack.push(child);
            }
        }

        Ok(())
    }

    /// All nodes below `root` in document order, `root` excluded
    pub fn descendants(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(root, |node| {
            if node.id != root {
                out.push(node.id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Check parent/child agreement and list integrity across the arena
    pub fn validate(&self) -> bool {
        self.nodes.iter().all(|node| {
            let parent_agrees = match node.parent {
                Some(p) => self
                    .nodes
                    .get(p.index())
                    .is_some_and(|parent| parent.children.contains(node.id)),
                None => true,
            };
            let children_agree = node.children.iter().all(|c| {
                self.nodes
                    .get(c.index())
                    .is_some_and(|child| child.parent == Some(node.id))
            });
            parent_agrees
                && children_agree
                && !node.children.contains(node.id)
                && node.children.is_consistent()
        })
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> (Dom, NodeId, [NodeId; 3]) {
        let mut dom = Dom::new();
        let root = dom.create_node("ul");
        let kids = [dom.create_node("li"), dom.create_node("li"), dom.create_node("li")];
        for kid in kids {
            assert!(dom.add_child(root, kid).unwrap());
        }
        (dom, root, kids)
    }

    #[test]
    fn test_arena_basic() {
        let mut dom = Dom::new();
        let id = dom.create_node(Tag::new("div").with_attr("id", "main"));
        assert_eq!(id, NodeId::new(0));

        let node = dom.get(id).unwrap();
        assert_eq!(node.tag_name(), "div");
        assert_eq!(dom.attribute(id, "id").unwrap(), Some("main"));
        assert_eq!(dom.get_parent(id).unwrap(), None);
        assert!(!dom.has_children(id).unwrap());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut dom = Dom::with_capacity(8);
        let ids: Vec<_> = (0..100).map(|_| dom.create_node("p")).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_unknown_id() {
        let dom = Dom::new();
        let err = dom.get(NodeId::new(42)).unwrap_err();
        assert!(matches!(err, DomError::NodeNotFound(id) if id == NodeId::new(42)));
    }

    #[test]
    fn test_add_child_links_both_ends() {
        let (dom, root, [a, b, c]) = abc();
        for kid in [a, b, c] {
            assert_eq!(dom.get_parent(kid).unwrap(), Some(root));
            assert_eq!(dom.get_child(root, kid).unwrap(), kid);
        }
        assert_eq!(dom.children(root).unwrap(), vec![a, b, c]);
        assert!(dom.validate());
    }

    #[test]
    fn test_add_self_fails_without_mutation() {
        let (mut dom, root, kids) = abc();
        let err = dom.add_child(root, root).unwrap_err();
        assert!(matches!(err, DomError::SelfReference(_)));
        assert_eq!(dom.children(root).unwrap(), kids.to_vec());
        assert_eq!(dom.get_parent(root).unwrap(), None);
    }

    #[test]
    fn test_add_twice_is_noop() {
        let (mut dom, root, [a, b, c]) = abc();
        assert!(!dom.add_child(root, a).unwrap());
        assert_eq!(dom.children(root).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_remove_absent_child_is_noop() {
        let (mut dom, root, kids) = abc();
        let stranger = dom.create_node("li");
        dom.remove_child(root, stranger).unwrap();
        assert_eq!(dom.children(root).unwrap(), kids.to_vec());
    }

    #[test]
    fn test_remove_child_clears_parent() {
        let (mut dom, root, [a, b, c]) = abc();
        dom.remove_child(root, b).unwrap();

        assert_eq!(dom.get_parent(b).unwrap(), None);
        assert_eq!(dom.children(root).unwrap(), vec![a, c]);
        assert_eq!(dom.next_child(root, a).unwrap(), Some(c));
        assert_eq!(dom.previous_child(root, c).unwrap(), Some(a));
        assert!(dom.validate());
    }

    #[test]
    fn test_child_boundaries() {
        let (dom, root, [a, _, c]) = abc();
        assert_eq!(dom.previous_child(root, a).unwrap(), None);
        assert_eq!(dom.next_child(root, c).unwrap(), None);

        let err = dom.next_child(root, root).unwrap_err();
        assert!(matches!(err, DomError::ChildNotFound { .. }));
    }

    #[test]
    fn test_first_last_on_leaf() {
        let (dom, root, [a, _, c]) = abc();
        assert_eq!(dom.first_child(root).unwrap(), a);
        assert_eq!(dom.last_child(root).unwrap(), c);
        assert!(matches!(
            dom.first_child(a).unwrap_err(),
            DomError::EmptyCollection(id) if id == a
        ));
        assert!(matches!(dom.last_child(a).unwrap_err(), DomError::EmptyCollection(_)));
    }

    #[test]
    fn test_set_parent_moves_node() {
        let mut dom = Dom::new();
        let p1 = dom.create_node("div");
        let p2 = dom.create_node("div");
        let b = dom.create_node("b");
        dom.add_child(p1, b).unwrap();

        assert!(dom.set_parent(b, p2).unwrap());
        assert!(!dom.get(p1).unwrap().children().contains(b));
        assert_eq!(dom.get_child(p2, b).unwrap(), b);
        assert_eq!(dom.get_parent(b).unwrap(), Some(p2));
        assert!(!dom.set_parent(b, p2).unwrap());
        assert!(dom.validate());
    }

    #[test]
    fn test_attach_below_descendant_is_rejected() {
        let mut dom = Dom::new();
        let a = dom.create_node("div");
        let b = dom.create_node("div");
        let c = dom.create_node("div");
        dom.add_child(a, b).unwrap();
        dom.add_child(b, c).unwrap();

        let err = dom.add_child(c, a).unwrap_err();
        assert!(matches!(err, DomError::HierarchyCycle { .. }));
        assert_eq!(dom.get_parent(a).unwrap(), None);
        assert!(!dom.has_children(c).unwrap());
        assert!(dom.validate());
    }

    #[test]
    fn test_detach() {
        let (mut dom, root, [a, b, c]) = abc();
        dom.detach(a).unwrap();
        dom.detach(root).unwrap();
        assert_eq!(dom.children(root).unwrap(), vec![b, c]);
        assert_eq!(dom.first_child(root).unwrap(), b);
    }

    #[test]
    fn test_is_descendant() {
        let mut dom = Dom::new();
        let root = dom.create_node("html");
        let body = dom.create_node("body");
        let p = dom.create_node("p");
        let other = dom.create_node("head");
        dom.add_child(root, body).unwrap();
        dom.add_child(body, p).unwrap();

        assert!(dom.is_descendant(root, p).unwrap());
        assert!(dom.is_descendant(root, body).unwrap());
        assert!(!dom.is_descendant(root, root).unwrap());
        assert!(!dom.is_descendant(body, other).unwrap());
    }

    #[test]
    fn test_deep_chain_is_walked_to_the_bottom() {
        let mut dom = Dom::new();
        let root = dom.create_node("div");
        let mut deepest = root;
        for _ in 0..(DomConfig::default().max_depth + 904) {
            let child = dom.create_node("div");
            dom.add_child(deepest, child).unwrap();
            deepest = child;
        }
        let outside = dom.create_node("span");

        assert!(dom.validate());
        assert!(dom.is_descendant(root, deepest).unwrap());
        assert!(!dom.is_descendant(root, outside).unwrap());
        assert_eq!(dom.descendants(root).unwrap().len(), dom.len() - 2);
        assert_eq!(dom.depth(deepest).unwrap(), dom.len() - 2);
    }

    #[test]
    fn test_truncate_drops_trailing_nodes() {
        let mut dom = Dom::new();
        let kept = dom.create_node("div");
        let mark = dom.len();
        let a = dom.create_node("a");
        let b = dom.create_node("b");
        dom.add_child(a, b).unwrap();

        dom.truncate(mark);

        assert_eq!(dom.len(), 1);
        assert!(dom.get(kept).is_ok());
        assert!(dom.get(a).unwrap_err().is_not_found());
        assert!(!dom.contains(b));
        assert_eq!(dom.create_node("p"), a);
        assert!(dom.validate());
    }

    #[test]
    fn test_traverse_df() {
        let mut dom = Dom::new();
        let root = dom.create_node("div");
        let span = dom.create_node("span");
        let b = dom.create_node("b");
        let p = dom.create_node("p");
        dom.add_child(root, span).unwrap();
        dom.add_child(span, b).unwrap();
        dom.add_child(root, p).unwrap();

        let mut visited = Vec::new();
        dom.traverse_df(root, |node| {
            visited.push(node.tag_name().to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(visited, vec!["div", "span", "b", "p"]);
        assert_eq!(dom.descendants(root).unwrap(), vec![span, b, p]);
    }
}
