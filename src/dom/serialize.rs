//! Markup serialization
//!
//! Writes a tree (or a subtree) back out as markup. Names and text are
//! written as parsed; only attribute quoting is normalized.

use super::document::Document;
use super::node::{NodeId, NodeKind};
use crate::core::entities::encode_attribute;
use crate::core::metadata::Dialect;
use std::fmt;

impl Document<'_> {
    /// Serialize `id` and its subtree
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::with_capacity(self.length(id).unwrap_or(0));
        write_node(self, id, &mut out);
        out
    }
}

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup(self.root()))
    }
}

fn write_node(doc: &Document<'_>, id: NodeId, out: &mut String) {
    let Some(kind) = doc.kind(id) else {
        return;
    };
    match kind {
        NodeKind::Root => {
            for child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeKind::Tag | NodeKind::ParentTag => write_tag(doc, id, kind, out),
        NodeKind::Content => out.push_str(doc.data(id).unwrap_or("")),
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(doc.data(id).unwrap_or(""));
            out.push_str("-->");
        }
        NodeKind::Section => {
            out.push_str("<![CDATA[");
            out.push_str(doc.data(id).unwrap_or(""));
            out.push_str("]]>");
        }
        NodeKind::Instruction => {
            out.push_str("<?");
            out.push_str(doc.data(id).unwrap_or(""));
            out.push_str(match doc.dialect() {
                Dialect::Html => ">",
                Dialect::Xml => "?>",
            });
        }
        NodeKind::Declaration => {
            out.push_str("<!");
            out.push_str(doc.data(id).unwrap_or(""));
            out.push('>');
        }
        NodeKind::Attribute => write_attribute(doc, id, out),
    }
}

fn write_tag(doc: &Document<'_>, id: NodeId, kind: NodeKind, out: &mut String) {
    let name = doc.name(id).unwrap_or("");
    out.push('<');
    out.push_str(name);
    for attr in doc.attributes(id) {
        write_attribute(doc, attr, out);
    }

    if kind == NodeKind::ParentTag {
        out.push('>');
        for child in doc.children(id) {
            write_node(doc, child, out);
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
        return;
    }

    let self_closed = doc.node(id).is_some_and(|n| n.is_self_closed());
    if self_closed || doc.dialect() == Dialect::Xml {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

fn write_attribute(doc: &Document<'_>, id: NodeId, out: &mut String) {
    out.push(' ');
    out.push_str(doc.name(id).unwrap_or(""));
    let Some(value) = doc.data(id) else {
        return;
    };

    out.push('=');
    if value.contains('"') && !value.contains('\'') {
        out.push('\'');
        out.push_str(value);
        out.push('\'');
    } else {
        out.push('"');
        out.push_str(&encode_attribute(value));
        out.push('"');
    }
}
