//! Core markup parsing primitives
//!
//! This module contains the fundamental building blocks the tree assembler
//! is made of:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: HTML and XML lexers producing one token at a time
//! - Attributes: lazy second pass over a tag's attribute data
//! - Metadata: the dialect-scoped tag metadata registry
//! - Entities: character reference decoding with Cow
//! - Encoding: BOM sniffing and encoding label resolution

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod metadata;
pub mod scanner;
pub mod span;
pub mod tokenizer;

pub use metadata::{Dialect, TagMeta, TagRegistry};
pub use span::Span;
pub use tokenizer::{HtmlLexer, Lexer, Token, TokenKind, XmlLexer};
