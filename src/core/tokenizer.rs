//! Markup Lexers - one token at a time over a chunk of text
//!
//! A lexer is a pure function of `(text, offset, at_end)`: it looks at the
//! start of `text`, which sits at absolute document offset `offset`, and
//! returns the token found there. When the answer depends on text that has
//! not arrived yet it returns [`TokenKind::Incomplete`] and the caller retries
//! once more text is available. With `at_end` set no more text can arrive, so
//! every unterminated construct degrades into a [`TokenKind::Discarded`] run
//! up to the next opener instead.
//!
//! Token kinds recognised:
//! - Content up to the next `<`
//! - Opening, closing and self-closing tags
//! - Comments `<!--...-->`, sections `<![CDATA[...]]>`
//! - Instructions `<?...?>` (XML) / `<?...>` (HTML) and declarations `<!...>`

use super::metadata::Dialect;
use super::scanner::{find_ignore_ascii_case, is_separator, Scanner, TagEnd};
use super::span::Span;
use memchr::{memchr, memmem};

/// Type of markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Character data between tags
    #[default]
    Content,
    /// `<name ...>`
    OpeningTag,
    /// `</name>`
    ClosingTag,
    /// `<name .../>`
    SelfClosingTag,
    /// `<!--...-->`
    Comment,
    /// `<![CDATA[...]]>`
    Section,
    /// `<?target ...?>`
    Instruction,
    /// `<!NAME ...>`
    Declaration,
    /// One attribute inside a tag's attribute data
    Attribute,
    /// Malformed markup kept as character data
    Discarded,
    /// More text is needed to decide
    Incomplete,
}

/// A token with absolute spans into the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    /// The whole token
    pub span: Span,
    /// Tag name, instruction target, declaration keyword or attribute name
    pub name: Span,
    /// Attribute data of a tag, inner text of comments/sections/instructions,
    /// or an attribute value with its quotes removed
    pub data: Span,
}

impl Token {
    /// Token covering `start..end` of the current text, without name or data
    fn plain(kind: TokenKind, offset: usize, start: usize, end: usize) -> Self {
        Token {
            kind,
            span: Span::between(offset + start, offset + end),
            name: Span::empty(offset + end),
            data: Span::empty(offset + end),
        }
    }

    fn with_name(mut self, offset: usize, (start, end): (usize, usize)) -> Self {
        self.name = Span::between(offset + start, offset + end);
        self
    }

    fn with_data(mut self, offset: usize, start: usize, end: usize) -> Self {
        self.data = Span::between(offset + start, offset + end);
        self
    }

    /// Whether more text is needed
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        self.kind == TokenKind::Incomplete
    }
}

/// Lexical rules of one dialect
pub trait Lexer: Send + Sync {
    /// Recognise the token at the start of `text`
    fn next_token(&self, text: &str, offset: usize, at_end: bool) -> Token;

    /// Recognise the next token inside a raw-content tag called `close_name`:
    /// everything is content until the matching closing tag.
    fn next_raw_token(&self, text: &str, offset: usize, close_name: &str, at_end: bool) -> Token;
}

/// HTML-family lexer
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLexer;

/// XML-family lexer
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlLexer;

static HTML_LEXER: HtmlLexer = HtmlLexer;
static XML_LEXER: XmlLexer = XmlLexer;

/// The lexer for `dialect`
pub fn lexer_for(dialect: Dialect) -> &'static dyn Lexer {
    match dialect {
        Dialect::Html => &HTML_LEXER,
        Dialect::Xml => &XML_LEXER,
    }
}

struct Rules {
    /// Characters allowed in names besides letters, digits, `-` and `_`
    name_extra: &'static [char],
    instruction_close: &'static str,
    fold_case: bool,
}

const HTML_RULES: Rules = Rules {
    name_extra: &[],
    instruction_close: ">",
    fold_case: true,
};

const XML_RULES: Rules = Rules {
    name_extra: &[':', '.'],
    instruction_close: "?>",
    fold_case: false,
};

impl Lexer for HtmlLexer {
    fn next_token(&self, text: &str, offset: usize, at_end: bool) -> Token {
        lex(&HTML_RULES, text, offset, at_end)
    }

    fn next_raw_token(&self, text: &str, offset: usize, close_name: &str, at_end: bool) -> Token {
        lex_raw(&HTML_RULES, text, offset, close_name, at_end)
    }
}

impl Lexer for XmlLexer {
    fn next_token(&self, text: &str, offset: usize, at_end: bool) -> Token {
        lex(&XML_RULES, text, offset, at_end)
    }

    fn next_raw_token(&self, text: &str, offset: usize, close_name: &str, at_end: bool) -> Token {
        lex_raw(&XML_RULES, text, offset, close_name, at_end)
    }
}

fn lex(rules: &Rules, text: &str, offset: usize, at_end: bool) -> Token {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Token::plain(TokenKind::Incomplete, offset, 0, 0);
    }

    if bytes[0] != b'<' {
        return match Scanner::new(text).find_opener() {
            Some(end) => Token::plain(TokenKind::Content, offset, 0, end),
            None => until_end(TokenKind::Content, text, offset, at_end),
        };
    }

    match bytes.get(1) {
        None => until_end(TokenKind::Discarded, text, offset, at_end),
        Some(b'!') => lex_bang(text, offset, at_end),
        Some(b'?') => lex_instruction(rules, text, offset, at_end),
        Some(b'/') => lex_closing(rules, text, offset, at_end),
        Some(_) => lex_opening(rules, text, offset, at_end),
    }
}

/// The rest of `text` as `kind` when the input is complete, otherwise wait
#[inline]
fn until_end(kind: TokenKind, text: &str, offset: usize, at_end: bool) -> Token {
    let kind = if at_end { kind } else { TokenKind::Incomplete };
    Token::plain(kind, offset, 0, text.len())
}

/// Malformed markup: discard up to the next opener
fn discard(text: &str, offset: usize, at_end: bool) -> Token {
    match Scanner::at(text, 1).find_opener() {
        Some(end) => Token::plain(TokenKind::Discarded, offset, 0, end),
        None => until_end(TokenKind::Discarded, text, offset, at_end),
    }
}

/// A construct whose closer never arrived
#[inline]
fn unterminated(text: &str, offset: usize, at_end: bool) -> Token {
    if at_end {
        discard(text, offset, at_end)
    } else {
        Token::plain(TokenKind::Incomplete, offset, 0, text.len())
    }
}

fn lex_bang(text: &str, offset: usize, at_end: bool) -> Token {
    const COMMENT: &str = "<!--";
    const SECTION: &str = "<![CDATA[";

    let scanner = Scanner::new(text);
    if scanner.starts_with(COMMENT) {
        return match Scanner::at(text, COMMENT.len()).find_seq("-->") {
            Some(close) => Token::plain(TokenKind::Comment, offset, 0, close + 3)
                .with_data(offset, COMMENT.len(), close),
            None => unterminated(text, offset, at_end),
        };
    }
    if scanner.starts_with(SECTION) {
        return match Scanner::at(text, SECTION.len()).find_seq("]]>") {
            Some(close) => Token::plain(TokenKind::Section, offset, 0, close + 3)
                .with_data(offset, SECTION.len(), close),
            None => unterminated(text, offset, at_end),
        };
    }
    // `<!`, `<!-`, `<![CD` could still become a comment or a section
    if !at_end && (COMMENT.starts_with(text) || SECTION.starts_with(text)) {
        return Token::plain(TokenKind::Incomplete, offset, 0, text.len());
    }

    match Scanner::at(text, 2).find_byte(b'>') {
        Some(close) => {
            let mut name = Scanner::at(text, 2);
            let token = Token::plain(TokenKind::Declaration, offset, 0, close + 1)
                .with_data(offset, 2, close);
            match name.read_name(&[]) {
                Some((start, end)) if end <= close => token.with_name(offset, (start, end)),
                _ => token,
            }
        }
        None => unterminated(text, offset, at_end),
    }
}

fn lex_instruction(rules: &Rules, text: &str, offset: usize, at_end: bool) -> Token {
    match Scanner::at(text, 2).find_seq(rules.instruction_close) {
        Some(close) => {
            let token = Token::plain(
                TokenKind::Instruction,
                offset,
                0,
                close + rules.instruction_close.len(),
            )
            .with_data(offset, 2, close);
            let mut target = Scanner::at(text, 2);
            match target.read_name(rules.name_extra) {
                Some((start, end)) if end <= close => token.with_name(offset, (start, end)),
                _ => token,
            }
        }
        None => unterminated(text, offset, at_end),
    }
}

fn lex_closing(rules: &Rules, text: &str, offset: usize, at_end: bool) -> Token {
    let mut scanner = Scanner::at(text, 2);
    if scanner.is_eof() {
        return until_end(TokenKind::Discarded, text, offset, at_end);
    }
    let Some((start, end)) = scanner.read_name(rules.name_extra) else {
        return discard(text, offset, at_end);
    };
    match text.as_bytes().get(end) {
        // the name may continue in the next chunk
        None => unterminated(text, offset, at_end),
        Some(&b) if is_separator(b) || b == b'>' || b == b'/' => {
            match scanner.find_byte(b'>') {
                Some(close) => Token::plain(TokenKind::ClosingTag, offset, 0, close + 1)
                    .with_name(offset, (start, end))
                    .with_data(offset, end, close),
                None => unterminated(text, offset, at_end),
            }
        }
        Some(_) => discard(text, offset, at_end),
    }
}

fn lex_opening(rules: &Rules, text: &str, offset: usize, at_end: bool) -> Token {
    let mut scanner = Scanner::at(text, 1);
    let Some((start, end)) = scanner.read_name(rules.name_extra) else {
        return discard(text, offset, at_end);
    };
    match text.as_bytes().get(end) {
        None => return unterminated(text, offset, at_end),
        Some(&b) if is_separator(b) || b == b'>' || b == b'/' => {}
        Some(_) => return discard(text, offset, at_end),
    }

    let close = match scanner.find_tag_end() {
        TagEnd::Closed(close) => close,
        TagEnd::OpenQuote { .. } if !at_end => {
            return Token::plain(TokenKind::Incomplete, offset, 0, text.len());
        }
        TagEnd::OpenQuote { fallback: Some(close) } => close,
        TagEnd::OpenQuote { fallback: None } | TagEnd::Unterminated => {
            return unterminated(text, offset, at_end);
        }
    };

    let self_closing = close > end && text.as_bytes()[close - 1] == b'/';
    let (kind, data_end) = if self_closing {
        (TokenKind::SelfClosingTag, close - 1)
    } else {
        (TokenKind::OpeningTag, close)
    };
    Token::plain(kind, offset, 0, close + 1)
        .with_name(offset, (start, end))
        .with_data(offset, end, data_end)
}

fn lex_raw(rules: &Rules, text: &str, offset: usize, close_name: &str, at_end: bool) -> Token {
    let bytes = text.as_bytes();
    let mut needle = String::with_capacity(close_name.len() + 2);
    needle.push_str("</");
    needle.push_str(close_name);

    let mut from = 0;
    loop {
        let found = if rules.fold_case {
            find_ignore_ascii_case(text, from, &needle)
        } else {
            memmem::find(&bytes[from..], needle.as_bytes()).map(|i| from + i)
        };
        let Some(at) = found else {
            // a partial `</name` may sit at the end of the chunk
            return until_end(TokenKind::Content, text, offset, at_end);
        };

        let after = at + needle.len();
        match bytes.get(after) {
            None => return until_end(TokenKind::Content, text, offset, at_end),
            Some(&b) if is_separator(b) || b == b'>' || b == b'/' => {
                let Some(close) = memchr(b'>', &bytes[after..]).map(|i| after + i) else {
                    return until_end(TokenKind::Content, text, offset, at_end);
                };
                if at > 0 {
                    return Token::plain(TokenKind::Content, offset, 0, at);
                }
                return Token::plain(TokenKind::ClosingTag, offset, 0, close + 1)
                    .with_name(offset, (2, after))
                    .with_data(offset, after, close);
            }
            Some(_) => from = at + 1,
        }
    }
}
