//! Selector queries
//!
//! The tree does not know how selectors match. It builds an evaluator from
//! the selector text, hands it the search root, and returns whatever the
//! evaluator found. Evaluators must report matches inside the root's
//! subtree in document order.
//!
//! [`SimpleSelector`] is a small built-in evaluator for single compound
//! selectors (`div`, `*`, `#main`, `a.nav[href]`). Anything with
//! combinators needs a real selector engine plugged in through [`Selector`].

use crate::arena::Dom;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId};
use smallvec::SmallVec;

/// Selector evaluator contract
pub trait Selector: Sized {
    /// Build an evaluator from selector text
    fn parse(text: &str) -> Result<Self>;

    /// Matches below `root`, in document order
    fn find(&self, dom: &Dom, root: NodeId) -> Result<Vec<NodeId>>;
}

impl Dom {
    /// Every match of `selector` under `node`, unmodified
    pub fn find<S: Selector>(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        self.get(node)?;
        let evaluator = S::parse(selector)?;
        evaluator.find(self, node)
    }

    /// The `index`-th match, or `None` when there are not that many
    pub fn find_nth<S: Selector>(
        &self,
        node: NodeId,
        selector: &str,
        index: usize,
    ) -> Result<Option<NodeId>> {
        Ok(self.find::<S>(node, selector)?.get(index).copied())
    }

    /// [`Dom::find`] with the built-in [`SimpleSelector`]
    pub fn select(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        self.find::<SimpleSelector>(node, selector)
    }

    /// [`Dom::find_nth`] with the built-in [`SimpleSelector`]
    pub fn select_nth(&self, node: NodeId, selector: &str, index: usize) -> Result<Option<NodeId>> {
        self.find_nth::<SimpleSelector>(node, selector, index)
    }
}

/// Attribute condition: presence, or exact value
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    key: String,
    value: Option<String>,
}

/// One compound selector: optional tag, id, classes and attribute tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
    attributes: SmallVec<[AttrMatch; 2]>,
}

impl SimpleSelector {
    /// Whether a single node satisfies every part of the selector
    pub fn matches(&self, node: &DomNode) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }

        if !self
            .classes
            .iter()
            .all(|class| node.tag().classes().any(|c| c == class.as_str()))
        {
            return false;
        }

        self.attributes.iter().all(|cond| match &cond.value {
            Some(value) => node.attr(&cond.key) == Some(value.as_str()),
            None => node.attr(&cond.key).is_some(),
        })
    }
}

fn invalid(text: &str, reason: &str) -> DomError {
    DomError::InvalidSelector(format!("{reason}: {text:?}"))
}

/// Split the leading identifier off `s`
fn split_ident(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    s.split_at(end)
}

impl Selector for SimpleSelector {
    fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid(text, "empty selector"));
        }

        let mut selector = SimpleSelector::default();
        let mut rest = match trimmed.strip_prefix('*') {
            Some(tail) => tail,
            None => {
                let (name, tail) = split_ident(trimmed);
                if !name.is_empty() {
                    selector.tag = Some(name.to_string());
                }
                tail
            }
        };

        while let Some(marker) = rest.chars().next() {
            match marker {
                '#' | '.' => {
                    let (name, tail) = split_ident(&rest[1..]);
                    if name.is_empty() {
                        return Err(invalid(text, "missing name"));
                    }
                    if marker == '#' {
                        selector.id = Some(name.to_string());
                    } else {
                        selector.classes.push(name.to_string());
                    }
                    rest = tail;
                }
                '[' => {
                    let end = rest.find(']').ok_or_else(|| invalid(text, "unclosed '['"))?;
                    let inner = &rest[1..end];
                    let (key, value) = match inner.split_once('=') {
                        Some((key, value)) => {
                            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                            (key.trim(), Some(value.to_string()))
                        }
                        None => (inner.trim(), None),
                    };
                    if key.is_empty() {
                        return Err(invalid(text, "missing attribute name"));
                    }
                    selector.attributes.push(AttrMatch {
                        key: key.to_string(),
                        value,
                    });
                    rest = &rest[end + 1..];
                }
                _ => return Err(invalid(text, "unsupported selector syntax")),
            }
        }

        Ok(selector)
    }

    fn find(&self, dom: &Dom, root: NodeId) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        dom.traverse_df(root, |node| {
            if node.id() != root && self.matches(node) {
                found.push(node.id());
            }
            Ok(())
        })?;
        Ok(found)
    }
}
