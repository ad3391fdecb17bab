//! Document tree nodes
//!
//! Arena-backed node tree for parsed markup, with O(1) ordered child
//! management and index-based parent links.
//!
//! ## Philosophy
//!
//! - **Good taste**: Data structures first, algorithms follow naturally
//! - **No special cases**: running off a sibling list is `None`, not an error
//! - **No cycles**: the arena owns nodes, links are plain indices
//!
//! ## Core Design
//!
//! ```text
//! Dom (owns Vec<DomNode>)
//!   DomNode { id, tag, parent: Option<NodeId>, children: ChildCollection }
//!                                                  ↓
//!                              id → { prev, next } (linked, O(1) splice)
//! ```

pub mod arena;
pub mod builder;
pub mod children;
pub mod error;
pub mod navigator;
pub mod query;
pub mod serializer;
pub mod types;

pub use arena::{Dom, DomConfig};
pub use builder::DomBuilder;
pub use children::{ChildCollection, ChildEntry};
pub use error::{DomError, Result};
pub use navigator::Ancestors;
pub use query::{Selector, SimpleSelector};
pub use serializer::{DomSerializer, NodeSnapshot, SerializerConfig};
pub use types::*;
