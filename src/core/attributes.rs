//! Attribute Tokens - second pass over a tag's attribute data
//!
//! The lexer only records where a tag's attribute data starts and ends. This
//! module splits that data into attribute tokens, lazily, without copying.

use super::scanner::is_separator;
use super::span::Span;
use super::tokenizer::{Token, TokenKind};
use memchr::memchr;

/// Iterator over the attributes in a tag's attribute data.
///
/// `data` is the attribute text and `offset` its absolute position in the
/// document. For a flag attribute (no `=`), the token's `span` equals its
/// `name` and `data` is empty.
pub struct AttributeTokens<'a> {
    data: &'a str,
    offset: usize,
    pos: usize,
}

impl<'a> AttributeTokens<'a> {
    pub fn new(data: &'a str, offset: usize) -> Self {
        AttributeTokens { data, offset, pos: 0 }
    }

    #[inline]
    fn skip_separators(&mut self) {
        let bytes = self.data.as_bytes();
        while self.pos < bytes.len() && (is_separator(bytes[self.pos]) || bytes[self.pos] == b'/') {
            self.pos += 1;
        }
    }

    /// Scan an attribute value starting at `start`; quotes nest the way the
    /// tag-end search treats them
    fn value_end(&self, start: usize) -> usize {
        let bytes = self.data.as_bytes();
        let mut pos = start;
        while pos < bytes.len() {
            match bytes[pos] {
                quote @ (b'"' | b'\'') => match memchr(quote, &bytes[pos + 1..]) {
                    Some(close) => pos += close + 2,
                    None => return bytes.len(),
                },
                b if is_separator(b) => break,
                _ => pos += 1,
            }
        }
        pos
    }
}

impl Iterator for AttributeTokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let bytes = self.data.as_bytes();
        loop {
            self.skip_separators();
            if self.pos >= bytes.len() {
                return None;
            }

            let name_start = self.pos;
            while self.pos < bytes.len()
                && !is_separator(bytes[self.pos])
                && bytes[self.pos] != b'='
                && bytes[self.pos] != b'/'
            {
                self.pos += 1;
            }
            let name_end = self.pos;
            if name_start == name_end {
                // stray '='
                self.pos += 1;
                continue;
            }

            let mut eq = name_end;
            while eq < bytes.len() && is_separator(bytes[eq]) {
                eq += 1;
            }
            let name = Span::between(self.offset + name_start, self.offset + name_end);

            if bytes.get(eq) != Some(&b'=') {
                return Some(Token {
                    kind: TokenKind::Attribute,
                    span: name,
                    name,
                    data: Span::empty(name.end()),
                });
            }

            let mut value_start = eq + 1;
            while value_start < bytes.len() && is_separator(bytes[value_start]) {
                value_start += 1;
            }
            let value_end = self.value_end(value_start);
            self.pos = value_end;

            let (data_start, data_end) = strip_quotes(bytes, value_start, value_end);
            return Some(Token {
                kind: TokenKind::Attribute,
                span: Span::between(self.offset + name_start, self.offset + value_end),
                name,
                data: Span::between(self.offset + data_start, self.offset + data_end),
            });
        }
    }
}

/// Remove the surrounding quotes of a wholly-quoted value
fn strip_quotes(bytes: &[u8], start: usize, end: usize) -> (usize, usize) {
    if end >= start + 2 {
        let quote = bytes[start];
        if (quote == b'"' || quote == b'\'')
            && memchr(quote, &bytes[start + 1..end]).map(|i| start + 1 + i) == Some(end - 1)
        {
            return (start + 1, end - 1);
        }
    }
    (start, end)
}

/// Whether an attribute token has no value
#[inline]
pub fn is_flag(token: &Token) -> bool {
    token.span.end() == token.name.end()
}
