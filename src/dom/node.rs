//! Tree node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Node text
//! is never stored: names and data are spans into the document source,
//! except on detached copies which own their strings.

use super::ring::{Links, RingArena};
use crate::core::metadata::TagMeta;
use crate::core::span::Span;
use std::sync::Arc;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Id of the document root
pub const ROOT: NodeId = 0;

/// Type of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Root,
    /// Tag without children (void or self-closed)
    Tag,
    /// Tag owning a child ring
    ParentTag,
    /// Character data
    Content,
    Comment,
    /// `<![CDATA[...]]>`
    Section,
    Instruction,
    Declaration,
    /// Member of a tag's attribute ring
    Attribute,
}

impl NodeKind {
    /// Whether this is a tag (with or without children)
    #[inline]
    pub fn is_tag(self) -> bool {
        matches!(self, NodeKind::Tag | NodeKind::ParentTag)
    }

    /// Whether the node can own a child ring
    #[inline]
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::ParentTag)
    }

    /// Content, comments and sections
    #[inline]
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeKind::Content | NodeKind::Comment | NodeKind::Section)
    }
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) links: Links,
    /// Head of the child ring
    pub(crate) children: Option<NodeId>,
    /// Head of the attribute ring
    pub(crate) attributes: Option<NodeId>,
    /// Absolute start offset
    pub(crate) offset: usize,
    /// Absolute end offset; grows as a tag's closing is found
    pub(crate) end: usize,
    /// End of the opening token (tags), `end` for everything else
    pub(crate) head_end: usize,
    /// Start of the real closing token, if one was matched
    pub(crate) close_start: Option<usize>,
    pub(crate) name: Span,
    pub(crate) data: Span,
    pub(crate) meta: Option<Arc<TagMeta>>,
    /// Frame still waiting for its closing tag
    pub(crate) open: bool,
    /// Written as `<name/>`
    pub(crate) self_closed: bool,
    /// Attribute without a value
    pub(crate) flag: bool,
    pub(crate) owned_name: Option<Box<str>>,
    pub(crate) owned_data: Option<Box<str>>,
}

impl Node {
    fn base(id: NodeId, kind: NodeKind, span: Span) -> Self {
        Node {
            kind,
            links: Links::detached(id),
            children: None,
            attributes: None,
            offset: span.offset,
            end: span.end(),
            head_end: span.end(),
            close_start: None,
            name: Span::empty(span.offset),
            data: Span::empty(span.offset),
            meta: None,
            open: false,
            self_closed: false,
            flag: false,
            owned_name: None,
            owned_data: None,
        }
    }

    /// Create the document root covering `len` bytes
    pub(crate) fn root(len: usize) -> Self {
        Node::base(ROOT, NodeKind::Root, Span::new(0, len))
    }

    /// Create a tag node from its opening token
    pub(crate) fn tag(id: NodeId, span: Span, name: Span, data: Span, meta: Arc<TagMeta>, container: bool) -> Self {
        let kind = if container {
            NodeKind::ParentTag
        } else {
            NodeKind::Tag
        };
        Node {
            name,
            data,
            meta: Some(meta),
            open: container,
            ..Node::base(id, kind, span)
        }
    }

    /// Create a leaf: content, comment, section, instruction or declaration
    pub(crate) fn leaf(id: NodeId, kind: NodeKind, span: Span, name: Span, data: Span) -> Self {
        Node {
            name,
            data,
            ..Node::base(id, kind, span)
        }
    }

    /// Create an attribute node
    pub(crate) fn attribute(id: NodeId, span: Span, name: Span, data: Span, flag: bool) -> Self {
        Node {
            name,
            data,
            flag,
            ..Node::base(id, NodeKind::Attribute, span)
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.links.parent
    }

    /// Absolute start offset in the source
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute end offset in the source
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of source covered
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.offset
    }

    /// Tag metadata (tags only)
    #[inline]
    pub fn meta(&self) -> Option<&Arc<TagMeta>> {
        self.meta.as_ref()
    }

    /// Whether a real closing tag was matched
    #[inline]
    pub fn has_closing_tag(&self) -> bool {
        self.close_start.is_some()
    }

    /// Whether the tag was written self-closed
    #[inline]
    pub fn is_self_closed(&self) -> bool {
        self.self_closed
    }

    /// Whether the attribute has no value
    #[inline]
    pub fn is_flag(&self) -> bool {
        self.flag
    }
}

impl RingArena for [Node] {
    #[inline]
    fn links(&self, id: NodeId) -> &Links {
        &self[id as usize].links
    }

    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        &mut self[id as usize].links
    }
}

impl RingArena for Vec<Node> {
    #[inline]
    fn links(&self, id: NodeId) -> &Links {
        self.as_slice().links(id)
    }

    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        self.as_mut_slice().links_mut(id)
    }
}
