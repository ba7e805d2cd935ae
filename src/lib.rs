//! RustyMarkup - forgiving zero-copy HTML/XML parsing
//!
//! Converts markup into a navigable element tree whose nodes point back into
//! the source instead of copying it. Malformed markup never fails a parse:
//! stray brackets become text, and tags closed in the wrong order are
//! recovered by grafting their children one level up.
//!
//! Drivers:
//! - Whole document: [`parse`], [`parse_html`], [`parse_xml`]
//! - Streaming: [`StreamParser`], [`parse_reader`], `parse_async` (feature `async`)
//! - Batch: [`parse_parallel`]
//!
//! ```
//! use rustymarkup::parse_html;
//!
//! let doc = parse_html("<b><i>bold and italic</b></i>");
//! let b = doc.first_child(doc.root()).unwrap();
//! let i = doc.first_child(b).unwrap();
//! assert_eq!(doc.name(i), Some("i"));
//! assert_eq!(doc.text_content(i), "bold and italic");
//! assert!(doc.is_well_formed());
//! ```

pub mod core;
pub mod dom;
pub mod error;
pub mod options;
pub mod reader;
pub mod strategy;

#[cfg(test)]
mod proptests;

pub use crate::core::{Dialect, TagMeta, TagRegistry};
pub use dom::{Document, Node, NodeId, NodeKind, ROOT};
pub use error::{Error, Result};
pub use options::{ParseOptions, ParseOptionsBuilder};
pub use reader::{DecodingReader, TextSource};
pub use strategy::{parse_parallel, parse_reader, parse_source, StreamParser};

#[cfg(feature = "async")]
pub use reader::AsyncDecodingReader;
#[cfg(feature = "async")]
pub use strategy::{parse_async, parse_async_with_cancel};

/// Parse a whole document held in memory
#[inline]
pub fn parse<'a>(input: &'a str, options: &ParseOptions) -> Document<'a> {
    Document::parse(input, options)
}

/// Parse HTML with default options
pub fn parse_html(input: &str) -> Document<'_> {
    Document::parse(input, &ParseOptions::html())
}

/// Parse XML with default options
pub fn parse_xml(input: &str) -> Document<'_> {
    Document::parse(input, &ParseOptions::xml())
}
