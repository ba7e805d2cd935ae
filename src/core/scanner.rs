//! SIMD-accelerated markup scanning using memchr
//!
//! All delimiters the lexers care about are ASCII, so scanning runs over
//! the UTF-8 bytes of a `&str` and every position it reports is a char
//! boundary.

use memchr::memmem;
use memchr::{memchr, memchr2};

/// Outcome of looking for the `>` that ends a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEnd {
    /// Position of the terminating `>`
    Closed(usize),
    /// A quoted value was opened but never closed; `fallback` is the first
    /// `>` after the opening quote, if any
    OpenQuote { fallback: Option<usize> },
    /// No `>` at all
    Unterminated,
}

/// Scanner for markup delimiter detection
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Create a scanner positioned at `pos`
    #[inline]
    pub fn at(input: &'a str, pos: usize) -> Self {
        Scanner { input, pos }
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get remaining text
    #[inline]
    pub fn remaining(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    /// Check if remaining input starts with `needle`
    #[inline]
    pub fn starts_with(&self, needle: &str) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Find next '<' (opener) at or after the current position using SIMD
    #[inline]
    pub fn find_opener(&self) -> Option<usize> {
        self.find_byte(b'<')
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.remaining().as_bytes()).map(|i| self.pos + i)
    }

    /// Find next occurrence of a byte sequence
    #[inline]
    pub fn find_seq(&self, needle: &str) -> Option<usize> {
        memmem::find(self.remaining().as_bytes(), needle.as_bytes()).map(|i| self.pos + i)
    }

    /// Read a name made of a letter followed by letters, digits, `-`, `_`
    /// and any of `extra`. Returns the `(start, end)` of the name.
    pub fn read_name(&mut self, extra: &[char]) -> Option<(usize, usize)> {
        let start = self.pos;
        let mut chars = self.remaining().char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() => {}
            _ => return None,
        }
        let mut end = self.input.len();
        for (i, c) in chars {
            if !(c.is_alphanumeric() || c == '-' || c == '_' || extra.contains(&c)) {
                end = start + i;
                break;
            }
        }
        self.pos = end;
        Some((start, end))
    }

    /// Find the `>` ending a tag, skipping `>` inside quoted attribute
    /// values. A quote only opens a value when it directly follows `=`
    /// (whitespace allowed in between), so stray apostrophes in text-like
    /// attribute data don't swallow the rest of the document.
    pub fn find_tag_end(&self) -> TagEnd {
        let bytes = self.input.as_bytes();
        let len = bytes.len();
        let mut pos = self.pos;

        while pos < len {
            let Some(rel) = memchr2(b'>', b'=', &bytes[pos..]) else {
                break;
            };
            pos += rel;
            match bytes[pos] {
                b'>' => return TagEnd::Closed(pos),
                b'=' => {
                    pos += 1;
                    while pos < len && is_separator(bytes[pos]) {
                        pos += 1;
                    }
                    if pos < len && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
                        let quote = bytes[pos];
                        match memchr(quote, &bytes[pos + 1..]) {
                            Some(close) => pos += close + 2,
                            None => {
                                let fallback = memchr(b'>', &bytes[pos + 1..]).map(|i| pos + 1 + i);
                                return TagEnd::OpenQuote { fallback };
                            }
                        }
                    }
                }
                _ => pos += 1,
            }
        }
        TagEnd::Unterminated
    }
}

/// Check if byte is a separator (ASCII whitespace)
#[inline]
pub fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// Case-insensitive search for `needle` (ASCII) in `haystack` from `from`.
///
/// Candidates are located with memchr on the needle's first byte, which
/// for close-tag needles is the `<` opener.
pub fn find_ignore_ascii_case(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    let first = *needle.first()?;
    let mut i = from;
    while i + needle.len() <= hay.len() {
        let rel = memchr(first, &hay[i..])?;
        i += rel;
        if i + needle.len() > hay.len() {
            return None;
        }
        if hay[i..i + needle.len()].eq_ignore_ascii_case(needle) {
            return Some(i);
        }
        i += 1;
    }
    None
}
