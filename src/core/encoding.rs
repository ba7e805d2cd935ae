//! Encoding Detection
//!
//! Detects the encoding of a byte stream from its byte order mark or the
//! UTF-16 `<` pattern, and resolves encoding labels found in markup
//! declarations. Decoding itself is done by encoding_rs.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

/// Encoding detected from the first bytes of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub encoding: &'static Encoding,
    /// A BOM or byte pattern fixed the encoding; later declarations are ignored
    pub locked: bool,
}

/// Detect the encoding from a byte order mark or initial bytes
pub fn detect(input: &[u8]) -> Option<Detected> {
    if let Some((encoding, _)) = Encoding::for_bom(input) {
        return Some(Detected {
            encoding,
            locked: true,
        });
    }
    // No BOM - check for UTF-16 pattern (< followed by null or null followed by <)
    let encoding = match input {
        [0x00, b'<', ..] => UTF_16BE,
        [b'<', 0x00, ..] => UTF_16LE,
        _ => return None,
    };
    Some(Detected {
        encoding,
        locked: true,
    })
}

/// Resolve an encoding label such as `"windows-1252"` or `" UTF-8 "`
///
/// A declared UTF-16 label means the text in front of us is actually
/// ASCII-compatible (otherwise the declaration could not have been read),
/// so it resolves to UTF-8.
pub fn resolve_label(label: &str) -> Result<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.trim().to_string()))?;
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Ok(UTF_8);
    }
    Ok(encoding.output_encoding())
}

/// Extract the `charset` parameter of a content-type value
/// (`text/html; charset=iso-8859-1`)
pub fn charset_from_content_type(value: &str) -> Option<&str> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let val = val.trim().trim_matches(|c| c == '"' || c == '\'');
        (!val.is_empty()).then_some(val)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16BE, WINDOWS_1252};

    #[test]
    fn test_detect_bom() {
        let detected = detect(&[0xEF, 0xBB, 0xBF, b'<']).unwrap();
        assert_eq!(detected.encoding, UTF_8);
        assert!(detected.locked);

        let detected = detect(&[0xFF, 0xFE, b'<', 0]).unwrap();
        assert_eq!(detected.encoding, UTF_16LE);
        assert!(detected.locked);
    }

    #[test]
    fn test_detect_utf16_pattern() {
        assert_eq!(detect(&[0x00, b'<', 0x00, b'a']).unwrap().encoding, UTF_16BE);
        assert_eq!(detect(&[b'<', 0x00, b'a', 0x00]).unwrap().encoding, UTF_16LE);
        assert!(detect(b"<html>").is_none());
        assert!(detect(b"").is_none());
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!(resolve_label(" windows-1252 ").unwrap(), WINDOWS_1252);
        assert_eq!(resolve_label("latin1").unwrap(), WINDOWS_1252);
        assert_eq!(resolve_label("utf-16").unwrap(), UTF_8);
        assert!(matches!(resolve_label("klingon"), Err(Error::UnknownEncoding(_))));
    }

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(charset_from_content_type("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(charset_from_content_type("text/html;charset=\"utf-8\""), Some("utf-8"));
        assert_eq!(charset_from_content_type("text/html"), None);
    }
}
