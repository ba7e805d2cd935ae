//! Parse options
//!
//! All knobs of a parse in one place. Options are cheap to clone: the tag
//! registry is shared through an `Arc`.

use crate::core::metadata::{Dialect, TagRegistry};
use crate::reader::DEFAULT_BUFFER_SIZE;
use encoding_rs::{Encoding, UTF_8};
use std::sync::Arc;

/// Default number of bytes the streaming driver inspects for an encoding
/// declaration
pub const DEFAULT_ENCODING_SNIFF_LIMIT: usize = 1024;

/// Options controlling a parse.
///
/// # Example
///
/// ```
/// use rustymarkup::{Dialect, ParseOptions};
///
/// let options = ParseOptions::builder()
///     .with_dialect(Dialect::Xml)
///     .with_read_buffer_size(4096)
///     .build();
/// assert_eq!(options.dialect, Dialect::Xml);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ParseOptions {
    pub dialect: Dialect,
    /// Bytes of a stream inspected for an encoding declaration
    pub encoding_sniff_limit: usize,
    /// Bytes requested from a reader at a time
    pub read_buffer_size: usize,
    /// Encoding assumed when the stream carries no byte order mark
    pub default_encoding: &'static Encoding,
    /// Registry shared across parses; a fresh one per parse when None
    pub registry: Option<Arc<TagRegistry>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            dialect: Dialect::Html,
            encoding_sniff_limit: DEFAULT_ENCODING_SNIFF_LIMIT,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            default_encoding: UTF_8,
            registry: None,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder::default()
    }

    /// Default options for HTML
    #[must_use]
    pub fn html() -> Self {
        Self::default()
    }

    /// Default options for XML
    #[must_use]
    pub fn xml() -> Self {
        ParseOptions {
            dialect: Dialect::Xml,
            ..Self::default()
        }
    }

    /// The registry to parse with: the shared one when it serves this
    /// dialect, a fresh catalog otherwise
    pub fn registry(&self) -> Arc<TagRegistry> {
        match &self.registry {
            Some(registry) if registry.dialect() == self.dialect => Arc::clone(registry),
            _ => Arc::new(TagRegistry::for_dialect(self.dialect)),
        }
    }
}

/// Builder for [`ParseOptions`]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptionsBuilder {
    /// Set the markup dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.options.dialect = dialect;
        self
    }

    /// Limit how far into a stream an encoding declaration is looked for.
    #[must_use]
    pub fn with_encoding_sniff_limit(mut self, limit: usize) -> Self {
        self.options.encoding_sniff_limit = limit;
        self
    }

    /// Set the reader buffer size.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.options.read_buffer_size = size;
        self
    }

    /// Set the encoding assumed for streams without a byte order mark.
    #[must_use]
    pub fn with_default_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.options.default_encoding = encoding;
        self
    }

    /// Share a tag registry across parses.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use rustymarkup::{ParseOptions, TagRegistry};
    ///
    /// let registry = Arc::new(TagRegistry::html());
    /// let options = ParseOptions::builder()
    ///     .with_registry(Arc::clone(&registry))
    ///     .build();
    /// assert!(Arc::ptr_eq(&options.registry(), &registry));
    /// ```
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<TagRegistry>) -> Self {
        self.options.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn build(self) -> ParseOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.dialect, Dialect::Html);
        assert_eq!(options.encoding_sniff_limit, 1024);
        assert_eq!(options.read_buffer_size, 8192);
        assert_eq!(options.default_encoding, UTF_8);
    }

    #[test]
    fn test_registry_dialect_mismatch_gets_fresh_catalog() {
        let options = ParseOptions::builder()
            .with_dialect(Dialect::Xml)
            .with_registry(Arc::new(TagRegistry::html()))
            .build();
        assert_eq!(options.registry().dialect(), Dialect::Xml);
    }

    #[test]
    fn test_shared_registry_accumulates_names() {
        let registry = Arc::new(TagRegistry::xml());
        let options = ParseOptions::builder()
            .with_dialect(Dialect::Xml)
            .with_registry(Arc::clone(&registry))
            .build();
        crate::parse("<custom/>", &options);
        assert!(registry.find("custom").is_some());
    }
}
