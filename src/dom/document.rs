//! Markup Document - Arena-based tree
//!
//! Efficient tree storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - Sibling rings for O(1) append and detach
//! - Zero-copy names and text via spans into the source
//!
//! A parsed document borrows its input. [`Document::to_detached`] and
//! [`Document::clone_element`] produce `'static` copies whose nodes own
//! their text, so they outlive the input.

use super::builder::TreeBuilder;
use super::node::{Node, NodeId, NodeKind, ROOT};
use super::ring::{self, Links, Members, RingCursor};
use crate::core::entities::decode_text;
use crate::core::metadata::Dialect;
use crate::core::span::Span;
use crate::error::{Error, Result};
use crate::options::ParseOptions;
use std::borrow::Cow;

/// A parsed markup document stored in arena format
#[derive(Debug, Clone)]
pub struct Document<'a> {
    /// Source text; None for detached copies
    source: Option<Cow<'a, str>>,
    /// Arena of nodes; the root is always node 0
    nodes: Vec<Node>,
    dialect: Dialect,
    well_formed: bool,
}

impl<'a> Document<'a> {
    /// Parse a complete document
    #[tracing::instrument(skip_all, fields(len = input.len(), dialect = ?options.dialect))]
    pub fn parse(input: &'a str, options: &ParseOptions) -> Self {
        let mut builder = TreeBuilder::new(options.registry());
        let dialect = builder.dialect();
        let consumed = builder.consume(input, 0, true);
        debug_assert_eq!(consumed, input.len());

        let (nodes, well_formed) = builder.finish(input.len());
        tracing::debug!(nodes = nodes.len(), well_formed, "parse complete");
        Document {
            source: Some(Cow::Borrowed(input)),
            nodes,
            dialect,
            well_formed,
        }
    }

    pub(crate) fn from_parts(
        source: Option<Cow<'a, str>>,
        nodes: Vec<Node>,
        dialect: Dialect,
        well_formed: bool,
    ) -> Self {
        Document {
            source,
            nodes,
            dialect,
            well_formed,
        }
    }

    /// The root node
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Source text the spans point into; None for detached copies
    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Whether every tag was closed by a matching closing tag
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.well_formed
    }

    /// Length of the source covered by the root
    pub fn len(&self) -> usize {
        self.nodes.first().map_or(0, Node::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes in the arena, attributes included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a node by ID
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.links.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.children
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        let head = self.first_child(id)?;
        Some(self.nodes[head as usize].links.prev)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let head = self.ring_head(id)?;
        let next = self.node(id)?.links.next;
        (next != head).then_some(next)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let head = self.ring_head(id)?;
        (id != head).then(|| self.nodes[id as usize].links.prev)
    }

    /// Head of the ring `id` belongs to
    fn ring_head(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        let parent = self.node(node.links.parent?)?;
        if node.kind == NodeKind::Attribute {
            parent.attributes
        } else {
            parent.children
        }
    }

    /// Iterate over the children of `id`
    pub fn children(&self, id: NodeId) -> Members<'_, Vec<Node>> {
        Members::new(&self.nodes, self.first_child(id))
    }

    /// Iterate over the attributes of a tag
    pub fn attributes(&self, id: NodeId) -> Members<'_, Vec<Node>> {
        Members::new(&self.nodes, self.node(id).and_then(|n| n.attributes))
    }

    /// Iterate over the descendants of `id` (depth-first, document order,
    /// `id` itself excluded)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_, 'a> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        DescendantIter { doc: self, stack }
    }

    /// Cursor over the children of `parent` that tolerates modification of
    /// the ring between steps
    pub fn children_cursor(&self, parent: NodeId) -> ChildCursor {
        ChildCursor {
            inner: RingCursor::new(parent),
        }
    }

    fn slice(&self, span: Span) -> &str {
        self.source.as_deref().map_or("", |source| span.slice(source, 0))
    }

    /// Name of a tag (canonical), attribute, instruction target or
    /// declaration keyword
    pub fn name(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Tag | NodeKind::ParentTag => node.meta.as_deref().map(|meta| &*meta.name),
            NodeKind::Attribute | NodeKind::Instruction | NodeKind::Declaration => {
                Some(node.owned_name.as_deref().unwrap_or_else(|| self.slice(node.name)))
            }
            _ => None,
        }
    }

    /// Raw text of a leaf or the value of an attribute (None for flags and
    /// tags)
    pub fn data(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Root | NodeKind::Tag | NodeKind::ParentTag => None,
            NodeKind::Attribute if node.flag => None,
            _ => Some(node.owned_data.as_deref().unwrap_or_else(|| self.slice(node.data))),
        }
    }

    /// Text of a leaf or attribute value with character references decoded.
    /// Sections and comments are returned as written.
    pub fn decoded_text(&self, id: NodeId) -> Option<Cow<'_, str>> {
        let data = self.data(id)?;
        match self.kind(id)? {
            NodeKind::Content | NodeKind::Attribute => Some(decode_text(data)),
            _ => Some(Cow::Borrowed(data)),
        }
    }

    /// Value of the attribute called `name` on a tag; flags yield `""`
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let attr = self.attributes(id).find(|&attr| {
            self.name(attr).is_some_and(|n| match self.dialect {
                Dialect::Html => n.eq_ignore_ascii_case(name),
                Dialect::Xml => n == name,
            })
        })?;
        Some(self.data(attr).unwrap_or(""))
    }

    /// Concatenated content and section text of `id` and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        let own = std::iter::once(id);
        for node in own.chain(self.descendants(id)) {
            if matches!(self.kind(node), Some(NodeKind::Content | NodeKind::Section)) {
                text.push_str(self.data(node).unwrap_or(""));
            }
        }
        text
    }

    /// Absolute start offset of a node
    pub fn offset(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(Node::offset)
    }

    /// Absolute end offset of a node
    pub fn end(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(Node::end)
    }

    /// Source length covered by a node
    pub fn length(&self, id: NodeId) -> Option<usize> {
        self.node(id).map(Node::len)
    }

    /// Attach the detached node `id` as the last child of `parent`.
    /// Attributes go to the attribute ring of a tag.
    pub fn append(&mut self, parent: NodeId, id: NodeId) -> Result<()> {
        if id == ROOT {
            return Err(Error::RootNotMovable);
        }
        let node_kind = self.kind(id).ok_or(Error::UnknownNode(id))?;
        let parent_kind = self.kind(parent).ok_or(Error::UnknownNode(parent))?;
        let attribute = node_kind == NodeKind::Attribute;
        if (attribute && !parent_kind.is_tag()) || (!attribute && !parent_kind.is_container()) {
            return Err(Error::NotAContainer(parent));
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == id {
                return Err(Error::WouldCycle { node: id, parent });
            }
            ancestor = self.parent(current);
        }

        let owner = &self.nodes[parent as usize];
        let head = if attribute { owner.attributes } else { owner.children };
        let head = ring::attach(&mut self.nodes, id, parent, head)?;
        let owner = &mut self.nodes[parent as usize];
        if attribute {
            owner.attributes = Some(head);
        } else {
            owner.children = Some(head);
        }
        Ok(())
    }

    /// Remove `id` (with its subtree) from its parent. Detaching a node that
    /// has no parent is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if id == ROOT {
            return Err(Error::RootNotMovable);
        }
        let node = self.node(id).ok_or(Error::UnknownNode(id))?;
        let Some(parent) = node.links.parent else {
            return Ok(());
        };
        let attribute = node.kind == NodeKind::Attribute;
        let head = self
            .ring_head(id)
            .ok_or(Error::NotInRing { node: id, parent })?;

        let head = ring::detach(&mut self.nodes, id, parent, head)?;
        let owner = &mut self.nodes[parent as usize];
        if attribute {
            owner.attributes = head;
        } else {
            owner.children = head;
        }
        Ok(())
    }

    /// Copy the whole document into one that owns its text
    pub fn to_detached(&self) -> Document<'static> {
        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            self.own_text(node);
        }
        Document {
            source: None,
            nodes,
            dialect: self.dialect,
            well_formed: self.well_formed,
        }
    }

    /// Copy `id` and its subtree into a new document whose root covers the
    /// element's source extent
    pub fn clone_element(&self, id: NodeId) -> Option<Document<'static>> {
        let element = self.node(id)?;
        if id == ROOT {
            return Some(self.to_detached());
        }

        let mut root = Node::root(0);
        root.offset = element.offset;
        root.end = element.end;
        let mut nodes = vec![root];

        let mut stack = vec![(id, ROOT)];
        while let Some((source, parent)) = stack.pop() {
            let copy = self.copy_node(source, &mut nodes);
            let head = nodes[parent as usize].children;
            if let Ok(head) = ring::attach(&mut nodes, copy, parent, head) {
                nodes[parent as usize].children = Some(head);
            }

            let mut attributes = None;
            for attr in self.attributes(source) {
                let attr_copy = self.copy_node(attr, &mut nodes);
                if let Ok(head) = ring::attach(&mut nodes, attr_copy, copy, attributes) {
                    attributes = Some(head);
                }
            }
            nodes[copy as usize].attributes = attributes;

            let children: Vec<NodeId> = self.children(source).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, copy)));
        }

        Some(Document {
            source: None,
            nodes,
            dialect: self.dialect,
            well_formed: self.well_formed,
        })
    }

    fn copy_node(&self, source: NodeId, nodes: &mut Vec<Node>) -> NodeId {
        let id = nodes.len() as NodeId;
        let mut node = self.nodes[source as usize].clone();
        node.links = Links::detached(id);
        node.children = None;
        node.attributes = None;
        self.own_text(&mut node);
        nodes.push(node);
        id
    }

    fn own_text(&self, node: &mut Node) {
        let (name, data) = match node.kind {
            NodeKind::Content | NodeKind::Comment | NodeKind::Section => (false, true),
            NodeKind::Instruction | NodeKind::Declaration => (true, true),
            NodeKind::Attribute => (true, !node.flag),
            NodeKind::Root | NodeKind::Tag | NodeKind::ParentTag => (false, false),
        };
        if name && node.owned_name.is_none() {
            node.owned_name = Some(self.slice(node.name).into());
        }
        if data && node.owned_data.is_none() {
            node.owned_data = Some(self.slice(node.data).into());
        }
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d, 'a> {
    doc: &'d Document<'a>,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIter<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Add children to stack in reverse order (so first child is processed first)
        let mut child = self.doc.last_child(current);
        while let Some(id) = child {
            self.stack.push(id);
            child = self.doc.prev_sibling(id);
        }

        Some(current)
    }
}

/// Child traversal that survives detaching and appending children between
/// steps. Children appended after the traversal began are not visited.
/// See [`RingCursor`].
#[derive(Debug, Clone, Copy)]
pub struct ChildCursor {
    inner: RingCursor,
}

impl ChildCursor {
    /// Next child of the cursor's parent, or None when done
    pub fn advance(&mut self, doc: &Document<'_>) -> Option<NodeId> {
        let head = doc.first_child(self.inner.owner());
        self.inner.advance(&doc.nodes, head)
    }
}
