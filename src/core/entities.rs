//! Character Reference Decoding
//!
//! Decodes the character references found in content and attribute values:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - A small set of common HTML named entities
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no references are present. Unknown or
//! malformed references are kept verbatim.

use memchr::memchr;
use std::borrow::Cow;

/// Decode the character references in `input`
///
/// Returns Borrowed if no references are present (zero-copy),
/// returns Owned if anything was decoded.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

fn decode_entities(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = memchr(b';', rest.as_bytes())
            .filter(|&semi| semi > 1 && semi <= 33)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                result.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric);
    }

    let c = match entity {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(c)
}

/// Decode a numeric character reference (after the `#`)
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.parse::<u32>().ok()?,
    };
    match codepoint {
        0 => None,
        cp => char::from_u32(cp),
    }
}

/// Escape an attribute value for a double-quoted context
///
/// Only `"` is replaced; the rest of the value is written as parsed.
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    if memchr(b'"', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace('"', "&quot;"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text("Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(decode_text("&lt;hello&gt; &amp; &quot;world&quot;"), "<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text("&#65;&#66;&#x43;&#X44;"), "ABCD");
        assert_eq!(decode_text("&#x1F600;"), "😀");
    }

    #[test]
    fn test_html_named_entities() {
        assert_eq!(decode_text("a&nbsp;b&hellip;"), "a\u{00A0}b\u{2026}");
    }

    #[test]
    fn test_unknown_and_malformed_kept() {
        assert_eq!(decode_text("&unknown; & &; &#xZZ; &#0;"), "&unknown; & &; &#xZZ; &#0;");
        assert_eq!(decode_text("fish & chips; tea"), "fish & chips; tea");
    }

    #[test]
    fn test_encode_attribute() {
        assert_eq!(encode_attribute("plain"), "plain");
        assert_eq!(encode_attribute("say \"hi\""), "say &quot;hi&quot;");
    }
}
