//! Tree Assembler
//!
//! Turns lexer tokens into the arena tree. The assembler keeps a stack of
//! open frames (tags waiting for their closing tag), seeded with the root.
//!
//! Recovery rules:
//! - A closing tag nobody is waiting for is kept as content.
//! - A closing tag that matches a frame below the top closes that frame.
//!   Formatting frames above it are carried: they stay open and are put
//!   back on the stack. Every other frame above it is grafted: it loses its
//!   children, which are spliced onto the tail of its own parent's ring.
//! - At the end of input every frame still open is grafted the same way.
//!
//! The assembler never looks at text beyond the token it is handed, so
//! feeding the same document in any chunking yields the same tree.

use super::node::{Node, NodeId, NodeKind, ROOT};
use super::ring;
use crate::core::attributes::{is_flag, AttributeTokens};
use crate::core::metadata::{Dialect, TagMeta, TagRegistry};
use crate::core::span::Span;
use crate::core::tokenizer::{lexer_for, Lexer, Token, TokenKind};
use std::sync::Arc;

/// Incremental tree assembler
pub struct TreeBuilder {
    lexer: &'static dyn Lexer,
    registry: Arc<TagRegistry>,
    nodes: Vec<Node>,
    frames: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new(registry: Arc<TagRegistry>) -> Self {
        let mut root = Node::root(0);
        root.open = true;
        let mut nodes = Vec::with_capacity(256);
        nodes.push(root);

        TreeBuilder {
            lexer: lexer_for(registry.dialect()),
            registry,
            nodes,
            frames: vec![ROOT],
        }
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.registry.dialect()
    }

    /// Nodes created so far
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of open frames, the root included
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Tokenize and assemble as much of `text` as can be decided.
    ///
    /// `text` starts at absolute offset `base`. Returns the number of bytes
    /// consumed; the rest must be handed back, extended, on the next call.
    /// With `at_end` set everything is consumed.
    pub fn consume(&mut self, text: &str, base: usize, at_end: bool) -> usize {
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let token = match self.raw_frame() {
                Some(meta) => self.lexer.next_raw_token(rest, base + pos, &meta.name, at_end),
                None => self.lexer.next_token(rest, base + pos, at_end),
            };
            if token.is_incomplete() {
                tracing::trace!(offset = base + pos, pending = rest.len(), "token needs more data");
                break;
            }
            debug_assert!(!token.span.is_empty(), "lexer returned an empty token");
            self.push(&token, text, base);
            pos += token.span.len;
        }
        pos
    }

    /// Close the document: graft every frame still open and fix the root's
    /// extent. Returns the arena and whether every tag was closed.
    pub fn finish(mut self, len: usize) -> (Vec<Node>, bool) {
        let well_formed = self.frames.len() == 1;
        if !well_formed {
            tracing::debug!(open = self.frames.len() - 1, "grafting tags left open at end of input");
        }
        while self.frames.len() > 1 {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            self.graft(frame);
        }

        let root = &mut self.nodes[ROOT as usize];
        root.open = false;
        root.end = len;
        (self.nodes, well_formed)
    }

    #[inline]
    fn current(&self) -> NodeId {
        self.frames.last().copied().unwrap_or(ROOT)
    }

    #[inline]
    fn next_id(&self) -> NodeId {
        self.nodes.len() as NodeId
    }

    fn raw_frame(&self) -> Option<Arc<TagMeta>> {
        let meta = self.nodes[self.current() as usize].meta.as_ref()?;
        meta.is_raw_content().then(|| Arc::clone(meta))
    }

    fn push(&mut self, token: &Token, text: &str, base: usize) {
        match token.kind {
            TokenKind::Content | TokenKind::Discarded => self.append_content(token.span),
            TokenKind::OpeningTag | TokenKind::SelfClosingTag => self.open_tag(token, text, base),
            TokenKind::ClosingTag => self.close_tag(token, text, base),
            TokenKind::Comment => self.append_leaf(NodeKind::Comment, token),
            TokenKind::Section => self.append_leaf(NodeKind::Section, token),
            TokenKind::Instruction => self.append_leaf(NodeKind::Instruction, token),
            TokenKind::Declaration => self.append_leaf(NodeKind::Declaration, token),
            TokenKind::Attribute | TokenKind::Incomplete => {}
        }
    }

    fn link(&mut self, parent: NodeId, id: NodeId) {
        let head = self.nodes[parent as usize].children;
        // fresh nodes are always detached
        if let Ok(head) = ring::attach(&mut self.nodes, id, parent, head) {
            self.nodes[parent as usize].children = Some(head);
        }
    }

    fn append_content(&mut self, span: Span) {
        let parent = self.current();
        if let Some(head) = self.nodes[parent as usize].children {
            let tail = self.nodes[head as usize].links.prev;
            let last = &mut self.nodes[tail as usize];
            if last.kind == NodeKind::Content && last.end == span.offset {
                last.end = span.end();
                last.head_end = last.end;
                last.data = Span::between(last.offset, last.end);
                return;
            }
        }

        let id = self.next_id();
        self.nodes
            .push(Node::leaf(id, NodeKind::Content, span, Span::empty(span.offset), span));
        self.link(parent, id);
    }

    fn append_leaf(&mut self, kind: NodeKind, token: &Token) {
        let parent = self.current();
        let id = self.next_id();
        self.nodes.push(Node::leaf(id, kind, token.span, token.name, token.data));
        self.link(parent, id);
    }

    fn open_tag(&mut self, token: &Token, text: &str, base: usize) {
        let meta = self.registry.find_or_create(token.name.slice(text, base));
        let container = meta.is_container && token.kind == TokenKind::OpeningTag;
        let parent = self.current();

        let id = self.next_id();
        let mut node = Node::tag(id, token.span, token.name, token.data, meta, container);
        node.self_closed = token.kind == TokenKind::SelfClosingTag;
        self.nodes.push(node);
        self.link(parent, id);
        self.add_attributes(id, token.data.slice(text, base), token.data.offset);

        if container {
            self.frames.push(id);
        }
    }

    fn add_attributes(&mut self, owner: NodeId, data: &str, offset: usize) {
        let mut head = None;
        for attr in AttributeTokens::new(data, offset) {
            let id = self.next_id();
            self.nodes
                .push(Node::attribute(id, attr.span, attr.name, attr.data, is_flag(&attr)));
            if let Ok(h) = ring::attach(&mut self.nodes, id, owner, head) {
                head = Some(h);
            }
        }
        self.nodes[owner as usize].attributes = head;
    }

    fn close_tag(&mut self, token: &Token, text: &str, base: usize) {
        let name = token.name.slice(text, base);
        let matched = self.registry.find(name).and_then(|meta| {
            self.frames.iter().rposition(|&frame| {
                self.nodes[frame as usize]
                    .meta
                    .as_ref()
                    .is_some_and(|m| Arc::ptr_eq(m, &meta))
            })
        });
        let Some(index) = matched else {
            tracing::debug!(tag = name, offset = token.span.offset, "unmatched closing tag kept as content");
            self.append_content(token.span);
            return;
        };

        let above = self.frames.split_off(index + 1);
        let Some(frame) = self.frames.pop() else {
            return;
        };

        let mut carried = Vec::new();
        for &open in above.iter().rev() {
            let formatting = self.nodes[open as usize]
                .meta
                .as_ref()
                .is_some_and(|m| m.is_formatting());
            if formatting {
                carried.push(open);
            } else {
                self.graft(open);
            }
        }
        self.close(frame, token.span);

        if !carried.is_empty() {
            tracing::debug!(tag = name, carried = carried.len(), "formatting tags carried past closing tag");
            self.frames.extend(carried.into_iter().rev());
        }
    }

    fn close(&mut self, frame: NodeId, span: Span) {
        let node = &mut self.nodes[frame as usize];
        node.open = false;
        node.close_start = Some(span.offset);
        node.end = span.end();
        self.enlarge_ancestors(frame, span.end());
    }

    /// Grow closed ancestors of `id` so they cover `end`
    fn enlarge_ancestors(&mut self, id: NodeId, end: usize) {
        let mut current = self.nodes[id as usize].links.parent;
        while let Some(parent) = current {
            let node = &mut self.nodes[parent as usize];
            if node.open || node.end >= end {
                break;
            }
            node.end = end;
            current = node.links.parent;
        }
    }

    /// Close `frame` at the end of its opening tag and move its children to
    /// the tail of its parent's ring
    fn graft(&mut self, frame: NodeId) {
        let node = &mut self.nodes[frame as usize];
        node.open = false;
        node.end = node.head_end;
        let (Some(head), Some(parent)) = (node.children.take(), node.links.parent) else {
            return;
        };

        let Ok((_, moved)) = ring::split(&mut self.nodes, head, head) else {
            return;
        };
        let target = self.nodes[parent as usize].children;
        let (head, count) = ring::splice(&mut self.nodes, moved, parent, target);
        self.nodes[parent as usize].children = Some(head);
        tracing::debug!(frame, parent, moved = count, "unclosed tag grafted onto its parent");

        let tail = self.nodes[head as usize].links.prev;
        let tail_end = self.nodes[tail as usize].end;
        let parent_node = &mut self.nodes[parent as usize];
        if !parent_node.open && parent_node.end < tail_end {
            parent_node.end = tail_end;
            self.enlarge_ancestors(parent, tail_end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TreeBuilder;
    use crate::core::metadata::TagRegistry;
    use crate::dom::{Document, NodeId, NodeKind};
    use crate::options::ParseOptions;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    /// Compact rendering of the tree shape: `name(children)` for parent
    /// tags, `name` for tags, quoted text for content
    fn outline(doc: &Document<'_>, id: NodeId) -> String {
        let parts: Vec<String> = doc
            .children(id)
            .map(|child| match doc.kind(child) {
                Some(NodeKind::ParentTag) => {
                    format!("{}({})", doc.name(child).unwrap_or("?"), outline(doc, child))
                }
                Some(NodeKind::Tag) => doc.name(child).unwrap_or("?").to_string(),
                Some(NodeKind::Content) => format!("{:?}", doc.data(child).unwrap_or("")),
                Some(NodeKind::Comment) => "#comment".to_string(),
                Some(NodeKind::Section) => "#section".to_string(),
                Some(NodeKind::Instruction) => "#instruction".to_string(),
                Some(NodeKind::Declaration) => "#declaration".to_string(),
                other => format!("{other:?}"),
            })
            .collect();
        parts.join(",")
    }

    fn html(input: &str) -> Document<'_> {
        Document::parse(input, &ParseOptions::html())
    }

    #[rstest]
    #[case("<b>bold</b> text", "b(\"bold\"),\" text\"", true)]
    #[case("<b><i>x</b></i>", "b(i(\"x\"))", true)]
    #[case("<div><p>text</div>more", "div(p(),\"text\"),\"more\"", true)]
    #[case("a</x>b", "\"a</x>b\"", true)]
    #[case("<p>one<br>two</p>", "p(\"one\",br,\"two\")", true)]
    #[case("<p>unclosed", "p(),\"unclosed\"", false)]
    #[case("<div/>x", "div,\"x\"", true)]
    #[case("<!-- c --><!DOCTYPE html><?pi?>", "#comment,#declaration,#instruction", true)]
    #[case("<script>if (a<b) {}</script>", "script(\"if (a<b) {}\")", true)]
    #[case("<DIV>x</div>", "div(\"x\")", true)]
    fn test_html_recovery(#[case] input: &str, #[case] expected: &str, #[case] well_formed: bool) {
        let doc = html(input);
        assert_eq!(outline(&doc, doc.root()), expected);
        assert_eq!(doc.is_well_formed(), well_formed);
    }

    #[test]
    fn test_graft_keeps_carried_formatting_open() {
        let doc = html("<div><b><p>x</div>y</b>");
        assert_eq!(outline(&doc, doc.root()), "div(b(p(),\"x\",\"y\"))");
        assert!(doc.is_well_formed());
    }

    #[test]
    fn test_closing_extends_ends() {
        let input = "<b><i>x</b></i>";
        let doc = html(input);
        let b = doc.first_child(doc.root()).unwrap();
        let i = doc.first_child(b).unwrap();
        assert_eq!(doc.end(i), Some(input.len()));
        // the outer tag grows to cover its carried child
        assert_eq!(doc.end(b), Some(input.len()));
        assert_eq!(doc.len(), input.len());
    }

    #[test]
    fn test_depth_tracks_open_frames() {
        let mut builder = TreeBuilder::new(Arc::new(TagRegistry::html()));
        builder.consume("<div><p><br>", 0, false);
        assert_eq!(builder.depth(), 3);
        builder.consume("</div>", 12, false);
        assert_eq!(builder.depth(), 1);
    }

    #[test]
    fn test_grafted_tag_ends_at_opening_tag() {
        let doc = html("<div><p>text</div>");
        let div = doc.first_child(doc.root()).unwrap();
        let p = doc.first_child(div).unwrap();
        assert_eq!(doc.end(p), Some("<div><p>".len()));
        assert!(!doc.node(p).unwrap().has_closing_tag());
        assert!(doc.node(div).unwrap().has_closing_tag());
        assert_eq!(doc.parent(doc.next_sibling(p).unwrap()), Some(div));
    }

    #[test]
    fn test_adjacent_content_merges() {
        let doc = html("a <1 b");
        let children: Vec<_> = doc.children(doc.root()).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.data(children[0]), Some("a <1 b"));
    }

    #[test]
    fn test_xml_has_no_void_or_raw_tags() {
        let doc = Document::parse("<br>x</br><script><a/></script>", &ParseOptions::xml());
        assert_eq!(outline(&doc, doc.root()), "br(\"x\"),script(a)");
    }

    #[test]
    fn test_xml_case_sensitive_closing() {
        let doc = Document::parse("<a>x</A></a>", &ParseOptions::xml());
        assert_eq!(outline(&doc, doc.root()), "a(\"x</A>\")");
    }
}
