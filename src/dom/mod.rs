//! DOM Module - Arena-based markup tree
//!
//! Implements the tree representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - Intrusive sibling rings for children and attributes
//! - An incremental assembler that builds the tree token by token

pub mod builder;
pub mod document;
pub mod node;
pub mod ring;
mod serialize;

pub use builder::TreeBuilder;
pub use document::{ChildCursor, DescendantIter, Document};
pub use node::{Node, NodeId, NodeKind, ROOT};
pub use ring::{Members, RingCursor};
