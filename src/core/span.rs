//! Span - absolute offset and length into the document source
//!
//! Every token and node refers back to the source text through spans, so
//! character data is never copied during a parse.

/// A span referencing a portion of the document source.
///
/// Offsets are absolute byte offsets from the start of the document, not
/// relative to whichever chunk produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Byte offset into the document
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Create a span from absolute start/end offsets
    #[inline]
    pub const fn between(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            len: end.saturating_sub(start),
        }
    }

    /// Create an empty span positioned at `offset`
    #[inline]
    pub const fn empty(offset: usize) -> Self {
        Self { offset, len: 0 }
    }

    /// Check if this span is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Extract the text from a source that starts at absolute offset `base`
    ///
    /// Returns an empty string when the span is not covered by `source`.
    #[inline]
    pub fn slice<'a>(&self, source: &'a str, base: usize) -> &'a str {
        let Some(start) = self.offset.checked_sub(base) else {
            return "";
        };
        source.get(start..start + self.len).unwrap_or("")
    }
}
