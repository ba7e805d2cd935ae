//! Parser invariants checked with property-based testing

use proptest::prelude::*;

use crate::core::tokenizer::lexer_for;
use crate::dom::{Document, NodeId, NodeKind};
use crate::options::ParseOptions;
use crate::strategy::StreamParser;

use super::generators::*;

/// Everything that identifies a node apart from its links
#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeFacts {
    kind: NodeKind,
    parent: Option<NodeId>,
    offset: usize,
    end: usize,
    name: Option<String>,
    data: Option<String>,
}

fn facts(doc: &Document<'_>) -> Vec<NodeFacts> {
    (0..doc.node_count() as NodeId)
        .filter_map(|id| {
            let node = doc.node(id)?;
            Some(NodeFacts {
                kind: node.kind(),
                parent: node.parent(),
                offset: node.offset(),
                end: node.end(),
                name: doc.name(id).map(str::to_string),
                data: doc.data(id).map(str::to_string),
            })
        })
        .collect()
}

/// Source spans of every token the tree was built from, sorted by offset
fn fragments(doc: &Document<'_>) -> Vec<(usize, usize)> {
    let source = doc.source().unwrap_or("");
    let lexer = lexer_for(doc.dialect());
    let mut spans = Vec::new();
    for id in 0..doc.node_count() as NodeId {
        let Some(node) = doc.node(id) else { continue };
        match node.kind() {
            NodeKind::Root | NodeKind::Attribute => {}
            NodeKind::Tag | NodeKind::ParentTag => {
                spans.push((node.offset, node.head_end));
                if let Some(start) = node.close_start {
                    let closing = lexer.next_token(&source[start..], start, true);
                    spans.push((start, closing.span.end()));
                }
            }
            _ => spans.push((node.offset(), node.end())),
        }
    }
    spans.sort_unstable();
    spans
}

/// Tree shape with text, ignoring offsets: depth, kind, name, data and
/// attributes of every node in document order
fn shape(doc: &Document<'_>) -> Vec<String> {
    fn walk(doc: &Document<'_>, id: NodeId, depth: usize, out: &mut Vec<String>) {
        for child in doc.children(id) {
            let attributes: Vec<String> = doc
                .attributes(child)
                .map(|attr| format!("{}={:?}", doc.name(attr).unwrap_or(""), doc.decoded_text(attr)))
                .collect();
            out.push(format!(
                "{depth} {:?} {:?} {:?} {}",
                doc.kind(child),
                doc.name(child),
                doc.data(child),
                attributes.join(" ")
            ));
            walk(doc, child, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(doc, doc.root(), 0, &mut out);
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    /// Opening tags, closing tags and leaves tile the input exactly, so no
    /// byte is lost however broken the markup is
    #[test]
    fn fragments_cover_input(input in markup_document()) {
        for options in [ParseOptions::html(), ParseOptions::xml()] {
            let doc = Document::parse(&input, &options);
            let mut cursor = 0;
            for (start, end) in fragments(&doc) {
                prop_assert_eq!(start, cursor, "gap or overlap in {:?}", input);
                prop_assert!(end > start);
                cursor = end;
            }
            prop_assert_eq!(cursor, input.len());
            prop_assert_eq!(doc.len(), input.len());
        }
    }

    /// Feeding any chunking of a document gives the tree of a whole parse
    #[test]
    fn streaming_matches_whole_parse((input, points) in chunked_document()) {
        for options in [ParseOptions::html(), ParseOptions::xml()] {
            let whole = Document::parse(&input, &options);

            let mut parser = StreamParser::new(&options);
            let mut last = 0;
            for &at in points.iter().chain(std::iter::once(&input.len())) {
                parser.feed(&input[last..at]);
                last = at;
            }
            let streamed = parser.finish();

            prop_assert_eq!(streamed.source(), Some(input.as_str()));
            prop_assert_eq!(streamed.is_well_formed(), whole.is_well_formed());
            prop_assert_eq!(facts(&streamed), facts(&whole));
        }
    }

    /// A detached copy reports the same nodes after the source is gone
    #[test]
    fn detached_copy_outlives_source(input in markup_document()) {
        let options = ParseOptions::html();
        let owned = input.clone();
        let doc = Document::parse(&owned, &options);
        let expected = facts(&doc);
        let text = doc.text_content(doc.root());
        let copy = doc.to_detached();
        drop(doc);
        drop(owned);

        prop_assert_eq!(copy.source(), None);
        prop_assert_eq!(copy.node_count(), expected.len());
        prop_assert_eq!(facts(&copy), expected);
        prop_assert_eq!(copy.text_content(copy.root()), text);
    }

    /// Cloning an element and serializing the clone matches serializing the
    /// element in place
    #[test]
    fn cloned_elements_render_alike(input in markup_document()) {
        let doc = Document::parse(&input, &ParseOptions::html());
        for id in doc.descendants(doc.root()) {
            if doc.kind(id).is_some_and(NodeKind::is_tag) {
                let clone = doc.clone_element(id);
                prop_assert!(clone.is_some());
                if let Some(clone) = clone {
                    prop_assert_eq!(clone.to_string(), doc.to_markup(id));
                    prop_assert_eq!(clone.len(), doc.length(id).unwrap_or(0));
                }
            }
        }
    }

    /// Serializing a well-formed document and parsing the result gives the
    /// same tree
    #[test]
    fn well_formed_round_trip(input in well_formed_document()) {
        let options = ParseOptions::html();
        let doc = Document::parse(&input, &options);
        prop_assert!(doc.is_well_formed());

        let markup = doc.to_string();
        let reparsed = Document::parse(&markup, &options);
        prop_assert!(reparsed.is_well_formed());
        prop_assert_eq!(shape(&reparsed), shape(&doc));
        prop_assert_eq!(reparsed.text_content(reparsed.root()), doc.text_content(doc.root()));
    }
}
