//! Crate error type
//!
//! Malformed markup never produces an error: lexical and structural
//! irregularities are absorbed into the tree. Errors are reserved for misuse
//! of the direct tree-manipulation API, I/O from byte sources, and
//! cancellation of an in-flight async parse.

use crate::dom::NodeId;

/// Errors surfaced by tree manipulation and the streaming readers
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("node {0} already belongs to a parent")]
    AlreadyAttached(NodeId),

    #[error("node {node} is not a member of the ring owned by {parent}")]
    NotInRing { node: NodeId, parent: NodeId },

    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),

    #[error("the document root cannot be moved")]
    RootNotMovable,

    #[error("node {node} cannot be appended to its own descendant {parent}")]
    WouldCycle { node: NodeId, parent: NodeId },

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse cancelled before end of input")]
    Cancelled,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
