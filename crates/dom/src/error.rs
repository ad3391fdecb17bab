//! Error types for tree operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Child {child} not found in node {parent}")]
    ChildNotFound { parent: NodeId, child: NodeId },

    #[error("Could not find an ancestor with \"{0}\" tag")]
    AncestorNotFound(String),

    #[error("Node {0} can not be its own child")]
    SelfReference(NodeId),

    #[error("Node {node} can not be attached below its own descendant {parent}")]
    HierarchyCycle { node: NodeId, parent: NodeId },

    #[error("Parent is not set for node {0}")]
    NoParent(NodeId),

    #[error("Node {0} has no children")]
    EmptyCollection(NodeId),

    #[error("Maximum tree depth exceeded: {limit}")]
    DepthExceeded { limit: usize },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomError {
    /// True for every lookup that came back empty-handed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomError::NodeNotFound(_)
                | DomError::ChildNotFound { .. }
                | DomError::AncestorNotFound(_)
        )
    }
}
