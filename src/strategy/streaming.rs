//! Streaming Driver
//!
//! Feeds text to the tree assembler chunk by chunk as it arrives. Text the
//! assembler cannot decide on yet stays pending and is retried, extended,
//! with the next chunk; consumed text becomes the source of the finished
//! document. Any chunking of the same text yields the same tree.
//!
//! While the start of the document streams in, the driver also watches for
//! an encoding declaration (`<meta charset>` in HTML, `<?xml encoding?>` in
//! XML) and reports it so the reader can switch decoders.

use crate::core::attributes::AttributeTokens;
use crate::core::encoding::{charset_from_content_type, resolve_label};
use crate::core::metadata::Dialect;
use crate::core::span::Span;
use crate::dom::{Document, Members, Node, NodeKind, TreeBuilder};
use crate::error::Result;
use crate::options::ParseOptions;
use crate::reader::{DecodingReader, TextSource};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::io::Read;

#[cfg(feature = "async")]
use crate::error::Error;
#[cfg(feature = "async")]
use crate::reader::AsyncDecodingReader;
#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use tokio::io::AsyncRead;

/// Incremental parser over text chunks
pub struct StreamParser {
    builder: TreeBuilder,
    /// Consumed text; every node span points into it
    source: String,
    /// Fed text not consumed yet
    pending: String,
    /// Dropped once a declaration was found or the sniff limit passed
    sniffer: Option<EncodingSniffer>,
}

impl StreamParser {
    pub fn new(options: &ParseOptions) -> Self {
        let builder = TreeBuilder::new(options.registry());
        let sniffer = EncodingSniffer::new(builder.dialect(), options.encoding_sniff_limit);
        StreamParser {
            builder,
            source: String::new(),
            pending: String::new(),
            sniffer: Some(sniffer),
        }
    }

    /// Absolute offset of the next unconsumed character
    #[inline]
    pub fn offset(&self) -> usize {
        self.source.len()
    }

    /// Text fed but not consumed yet
    #[inline]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Consume as much of `text` as can be decided and return how many
    /// bytes were consumed. The caller keeps the rest and passes it again,
    /// followed by new text, on the next call.
    ///
    /// This is the low-level entry point; [`feed`](Self::feed) keeps the
    /// pending text itself. Do not mix the two on one parser.
    pub fn parse_chunk(&mut self, text: &str) -> usize {
        let consumed = self.builder.consume(text, self.source.len(), false);
        self.source.push_str(&text[..consumed]);
        consumed
    }

    /// Feed the next chunk. Returns an encoding when a declaration asking
    /// for a different one was just found; the caller should decode the
    /// rest of the input with it.
    pub fn feed(&mut self, chunk: &str) -> Option<&'static Encoding> {
        if self.pending.is_empty() {
            let consumed = self.parse_chunk(chunk);
            self.pending.push_str(&chunk[consumed..]);
        } else {
            let mut text = std::mem::take(&mut self.pending);
            text.push_str(chunk);
            let consumed = self.parse_chunk(&text);
            text.drain(..consumed);
            self.pending = text;
        }
        self.sniff()
    }

    /// Consume everything pending as the end of input and return the tree
    #[tracing::instrument(skip_all, fields(offset = self.source.len(), pending = self.pending.len()))]
    pub fn finish(mut self) -> Document<'static> {
        let pending = std::mem::take(&mut self.pending);
        let consumed = self.builder.consume(&pending, self.source.len(), true);
        debug_assert_eq!(consumed, pending.len());
        self.source.push_str(&pending);

        let dialect = self.builder.dialect();
        let (nodes, well_formed) = self.builder.finish(self.source.len());
        tracing::debug!(nodes = nodes.len(), well_formed, "stream parse complete");
        Document::from_parts(Some(Cow::Owned(self.source)), nodes, dialect, well_formed)
    }

    /// Drop everything parsed so far; the source is about to hand out the
    /// stream again from its start
    fn restart(self, options: &ParseOptions) -> Self {
        tracing::debug!(discarded = self.source.len() + self.pending.len(), "restarting parse from stream start");
        StreamParser::new(options)
    }

    fn sniff(&mut self) -> Option<&'static Encoding> {
        let sniffer = self.sniffer.as_mut()?;
        match sniffer.inspect(self.builder.nodes(), &self.source) {
            Sniff::Continue => None,
            Sniff::Done => {
                self.sniffer = None;
                None
            }
            Sniff::Switch(encoding) => {
                tracing::debug!(encoding = encoding.name(), offset = self.source.len(), "encoding declaration found");
                self.sniffer = None;
                Some(encoding)
            }
        }
    }
}

enum Sniff {
    Continue,
    Done,
    Switch(&'static Encoding),
}

/// Looks at nodes as they are created for an encoding declaration
struct EncodingSniffer {
    dialect: Dialect,
    limit: usize,
    /// Nodes before this index were inspected
    scanned: usize,
}

impl EncodingSniffer {
    fn new(dialect: Dialect, limit: usize) -> Self {
        EncodingSniffer {
            dialect,
            limit,
            scanned: 0,
        }
    }

    fn inspect(&mut self, nodes: &[Node], source: &str) -> Sniff {
        let start = self.scanned.min(nodes.len());
        self.scanned = nodes.len();

        for node in &nodes[start..] {
            if node.offset() >= self.limit {
                return Sniff::Done;
            }
            let label = match self.dialect {
                Dialect::Html => match html_declaration(nodes, node, source) {
                    Declared::Label(label) => label,
                    Declared::Body => return Sniff::Done,
                    Declared::Nothing => continue,
                },
                Dialect::Xml => match xml_declaration(node, source) {
                    Some(label) => label,
                    None => continue,
                },
            };

            return match resolve_label(label) {
                Ok(encoding) => Sniff::Switch(encoding),
                Err(err) => {
                    tracing::debug!(%err, "ignoring encoding declaration");
                    Sniff::Done
                }
            };
        }

        if source.len() >= self.limit {
            Sniff::Done
        } else {
            Sniff::Continue
        }
    }
}

enum Declared<'s> {
    Nothing,
    /// The body started; declarations after this point don't count
    Body,
    Label(&'s str),
}

fn html_declaration<'s>(nodes: &[Node], node: &Node, source: &'s str) -> Declared<'s> {
    if !node.kind().is_tag() {
        return Declared::Nothing;
    }
    let Some(meta) = node.meta() else {
        return Declared::Nothing;
    };
    match &*meta.name {
        "body" => return Declared::Body,
        "meta" => {}
        _ => return Declared::Nothing,
    }
    let in_head = std::iter::successors(node.parent(), |&id| nodes[id as usize].parent())
        .any(|id| nodes[id as usize].meta().is_some_and(|meta| &*meta.name == "head"));
    if !in_head {
        return Declared::Nothing;
    }

    let attribute = |wanted: &str| {
        Members::new(nodes, node.attributes).find_map(|attr| {
            let attr = &nodes[attr as usize];
            attr.name
                .slice(source, 0)
                .eq_ignore_ascii_case(wanted)
                .then(|| attr.data.slice(source, 0))
        })
    };

    if let Some(charset) = attribute("charset") {
        return Declared::Label(charset);
    }
    let content_type = attribute("http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
    match attribute("content").and_then(|content| content_type.then(|| charset_from_content_type(content)).flatten()) {
        Some(charset) => Declared::Label(charset),
        None => Declared::Nothing,
    }
}

fn xml_declaration<'s>(node: &Node, source: &'s str) -> Option<&'s str> {
    if node.kind() != NodeKind::Instruction || node.name.slice(source, 0) != "xml" {
        return None;
    }
    let data = Span::between(node.name.end(), node.data.end());
    AttributeTokens::new(data.slice(source, 0), data.offset).find_map(|attr| {
        (attr.name.slice(source, 0) == "encoding").then(|| attr.data.slice(source, 0))
    })
}

/// Parse everything a text source yields, switching its encoding when the
/// document declares one
pub fn parse_source<S: TextSource + ?Sized>(source: &mut S, options: &ParseOptions) -> Result<Document<'static>> {
    let mut parser = StreamParser::new(options);
    while let Some(chunk) = source.next_chunk()? {
        if let Some(encoding) = parser.feed(&chunk) {
            if source.change_encoding(encoding) {
                parser = parser.restart(options);
            }
        }
    }
    Ok(parser.finish())
}

/// Parse a document from a byte reader
#[tracing::instrument(skip_all, fields(dialect = ?options.dialect))]
pub fn parse_reader<R: Read>(reader: R, options: &ParseOptions) -> Result<Document<'static>> {
    let mut source = DecodingReader::with_options(reader, options);
    parse_source(&mut source, options)
}

/// Parse a document from an async byte reader
#[cfg(feature = "async")]
pub async fn parse_async<R: AsyncRead + Unpin>(reader: R, options: &ParseOptions) -> Result<Document<'static>> {
    parse_async_with_cancel(reader, options, std::future::pending::<()>()).await
}

/// Parse a document from an async byte reader, giving up with
/// [`Error::Cancelled`] as soon as `cancel` completes
#[cfg(feature = "async")]
#[tracing::instrument(skip_all, fields(dialect = ?options.dialect))]
pub async fn parse_async_with_cancel<R, C>(reader: R, options: &ParseOptions, cancel: C) -> Result<Document<'static>>
where
    R: AsyncRead + Unpin,
    C: Future<Output = ()>,
{
    let mut source = AsyncDecodingReader::with_options(reader, options);
    let mut parser = StreamParser::new(options);
    let mut cancel = std::pin::pin!(cancel);

    loop {
        let chunk = tokio::select! {
            biased;
            () = &mut cancel => {
                tracing::debug!(offset = parser.offset(), "parse cancelled");
                return Err(Error::Cancelled);
            }
            chunk = source.next_chunk() => chunk?,
        };
        let Some(chunk) = chunk else {
            break;
        };
        if let Some(encoding) = parser.feed(&chunk) {
            if source.change_encoding(encoding) {
                parser = parser.restart(options);
            }
        }
    }
    Ok(parser.finish())
}
