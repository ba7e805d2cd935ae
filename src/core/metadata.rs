//! Tag Metadata Registry
//!
//! Shared, interned per-name metadata for one markup dialect. Tags in a
//! tree hold an `Arc<TagMeta>` from the registry, so two tags with the same
//! (case-folded) name point at the same metadata and name matching is a
//! pointer comparison.
//!
//! The registry is lazily extended: unknown names are inserted on first
//! lookup. Lookups take a read lock; inserts take the write lock and
//! re-check, so a single registry can back any number of parallel parses.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Markup dialect. Selects the lexer rules, the metadata catalog and the
/// encoding declaration the streaming driver looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Dialect {
    /// HTML-family markup: case-insensitive names, void and raw-content tags
    #[default]
    Html,
    /// XML-family markup: case-sensitive names, every tag is a container
    Xml,
}

/// How the interior of a tag is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingMode {
    /// Interior is tokenized as markup
    Default,
    /// Interior is never tokenized as markup until the matching closing tag
    RawContent,
    /// Inline formatting tag; survives being closed out of order
    Formatting,
}

/// Broad category of content a tag may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    /// Nothing (void tags)
    Nothing,
    /// Text only
    Text,
    /// Inline (phrasing) content
    Phrasing,
    /// Any flow content
    Flow,
    /// Document metadata (`head` children)
    Metadata,
}

/// Rendering layout of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Inline,
    Block,
}

/// Metadata for one tag name
#[derive(Debug, PartialEq, Eq)]
pub struct TagMeta {
    /// Canonical name (lower-cased for HTML)
    pub name: Box<str>,
    /// Whether the tag owns a child ring
    pub is_container: bool,
    pub parsing_mode: ParsingMode,
    pub permitted_content: ContentCategory,
    pub layout: Layout,
}

impl TagMeta {
    fn container(name: &str, parsing_mode: ParsingMode, permitted_content: ContentCategory, layout: Layout) -> Self {
        TagMeta {
            name: name.into(),
            is_container: true,
            parsing_mode,
            permitted_content,
            layout,
        }
    }

    fn void(name: &str, layout: Layout) -> Self {
        TagMeta {
            name: name.into(),
            is_container: false,
            parsing_mode: ParsingMode::Default,
            permitted_content: ContentCategory::Nothing,
            layout,
        }
    }

    /// Whether the interior is raw content
    #[inline]
    pub fn is_raw_content(&self) -> bool {
        self.parsing_mode == ParsingMode::RawContent
    }

    /// Whether the tag is an inline formatting tag
    #[inline]
    pub fn is_formatting(&self) -> bool {
        self.parsing_mode == ParsingMode::Formatting
    }
}

const HTML_VOID: &[(&str, Layout)] = &[
    ("area", Layout::Inline),
    ("base", Layout::Block),
    ("br", Layout::Inline),
    ("col", Layout::Block),
    ("embed", Layout::Inline),
    ("hr", Layout::Block),
    ("img", Layout::Inline),
    ("input", Layout::Inline),
    ("link", Layout::Block),
    ("meta", Layout::Block),
    ("param", Layout::Block),
    ("source", Layout::Block),
    ("track", Layout::Block),
    ("wbr", Layout::Inline),
];

const HTML_RAW: &[(&str, Layout)] = &[
    ("script", Layout::Block),
    ("style", Layout::Block),
    ("textarea", Layout::Inline),
    ("title", Layout::Block),
    ("xmp", Layout::Block),
];

const HTML_FORMATTING: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt", "u",
];

const HTML_BLOCK: &[(&str, ContentCategory)] = &[
    ("html", ContentCategory::Flow),
    ("head", ContentCategory::Metadata),
    ("body", ContentCategory::Flow),
    ("address", ContentCategory::Flow),
    ("article", ContentCategory::Flow),
    ("aside", ContentCategory::Flow),
    ("blockquote", ContentCategory::Flow),
    ("dd", ContentCategory::Flow),
    ("details", ContentCategory::Flow),
    ("div", ContentCategory::Flow),
    ("dl", ContentCategory::Flow),
    ("dt", ContentCategory::Flow),
    ("fieldset", ContentCategory::Flow),
    ("figure", ContentCategory::Flow),
    ("footer", ContentCategory::Flow),
    ("form", ContentCategory::Flow),
    ("h1", ContentCategory::Phrasing),
    ("h2", ContentCategory::Phrasing),
    ("h3", ContentCategory::Phrasing),
    ("h4", ContentCategory::Phrasing),
    ("h5", ContentCategory::Phrasing),
    ("h6", ContentCategory::Phrasing),
    ("header", ContentCategory::Flow),
    ("li", ContentCategory::Flow),
    ("main", ContentCategory::Flow),
    ("nav", ContentCategory::Flow),
    ("ol", ContentCategory::Flow),
    ("p", ContentCategory::Phrasing),
    ("pre", ContentCategory::Phrasing),
    ("section", ContentCategory::Flow),
    ("table", ContentCategory::Flow),
    ("tbody", ContentCategory::Flow),
    ("td", ContentCategory::Flow),
    ("th", ContentCategory::Flow),
    ("thead", ContentCategory::Flow),
    ("tfoot", ContentCategory::Flow),
    ("tr", ContentCategory::Flow),
    ("ul", ContentCategory::Flow),
];

/// Dialect-scoped, concurrency-safe metadata table
#[derive(Debug)]
pub struct TagRegistry {
    dialect: Dialect,
    tags: RwLock<HashMap<Box<str>, Arc<TagMeta>>>,
}

impl TagRegistry {
    /// Create an empty registry: every name resolves to a plain container
    pub fn empty(dialect: Dialect) -> Self {
        TagRegistry {
            dialect,
            tags: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-populated with the catalog for `dialect`
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Html => Self::html(),
            Dialect::Xml => Self::xml(),
        }
    }

    /// HTML catalog: void, raw-content, formatting and block tags
    pub fn html() -> Self {
        let mut tags = HashMap::with_capacity(128);
        let mut insert = |meta: TagMeta| {
            tags.insert(meta.name.clone(), Arc::new(meta));
        };

        for &(name, layout) in HTML_VOID {
            insert(TagMeta::void(name, layout));
        }
        for &(name, layout) in HTML_RAW {
            insert(TagMeta::container(name, ParsingMode::RawContent, ContentCategory::Text, layout));
        }
        for &name in HTML_FORMATTING {
            insert(TagMeta::container(name, ParsingMode::Formatting, ContentCategory::Phrasing, Layout::Inline));
        }
        for &(name, content) in HTML_BLOCK {
            insert(TagMeta::container(name, ParsingMode::Default, content, Layout::Block));
        }

        TagRegistry {
            dialect: Dialect::Html,
            tags: RwLock::new(tags),
        }
    }

    /// XML catalog: nothing predefined, names are case-sensitive
    pub fn xml() -> Self {
        Self::empty(Dialect::Xml)
    }

    /// The dialect this registry serves
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Look up `name`, inserting default metadata on first sight
    pub fn find_or_create(&self, name: &str) -> Arc<TagMeta> {
        let key = self.fold(name);

        if let Some(meta) = self.read_lock().get(key.as_ref()) {
            return Arc::clone(meta);
        }

        let mut tags = self
            .tags
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // another parse may have won the race between the two locks
        let meta = tags.entry(key.clone().into()).or_insert_with(|| {
            Arc::new(TagMeta::container(
                &key,
                ParsingMode::Default,
                ContentCategory::Flow,
                Layout::Inline,
            ))
        });
        Arc::clone(meta)
    }

    /// Look up `name` without inserting
    pub fn find(&self, name: &str) -> Option<Arc<TagMeta>> {
        let key = self.fold(name);
        self.read_lock().get(key.as_ref()).cloned()
    }

    /// Number of distinct names known
    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    /// Whether no names are known
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fold<'n>(&self, name: &'n str) -> std::borrow::Cow<'n, str> {
        match self.dialect {
            Dialect::Html if name.bytes().any(|b| b.is_ascii_uppercase()) => {
                std::borrow::Cow::Owned(name.to_ascii_lowercase())
            }
            _ => std::borrow::Cow::Borrowed(name),
        }
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Box<str>, Arc<TagMeta>>> {
        // metadata is insert-only, so a poisoned lock still holds a usable table
        self.tags
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_catalog() {
        let registry = TagRegistry::html();
        let br = registry.find_or_create("br");
        assert!(!br.is_container);

        let script = registry.find_or_create("SCRIPT");
        assert!(script.is_raw_content());
        assert_eq!(&*script.name, "script");

        let b = registry.find_or_create("b");
        assert!(b.is_formatting());
        assert_eq!(b.layout, Layout::Inline);

        assert_eq!(registry.find_or_create("div").layout, Layout::Block);
    }

    #[test]
    fn test_case_folding_shares_metadata() {
        let registry = TagRegistry::html();
        let a = registry.find_or_create("Custom-Tag");
        let b = registry.find_or_create("custom-tag");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_container);
        assert_eq!(a.parsing_mode, ParsingMode::Default);
    }

    #[test]
    fn test_xml_is_case_sensitive() {
        let registry = TagRegistry::xml();
        let upper = registry.find_or_create("Item");
        let lower = registry.find_or_create("item");
        assert!(!Arc::ptr_eq(&upper, &lower));
        assert_eq!(registry.len(), 2);
        assert!(registry.find_or_create("script").is_container);
        assert!(!registry.find_or_create("script").is_raw_content());
    }

    #[test]
    fn test_find_does_not_insert() {
        let registry = TagRegistry::xml();
        assert!(registry.find("x").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parallel_lookup_or_insert() {
        use rayon::prelude::*;

        let registry = TagRegistry::html();
        let names: Vec<String> = (0..64).map(|i| format!("x-{}", i % 8)).collect();
        let metas: Vec<Arc<TagMeta>> = names.par_iter().map(|n| registry.find_or_create(n)).collect();
        for (name, meta) in names.iter().zip(&metas) {
            assert!(Arc::ptr_eq(meta, &registry.find_or_create(name)));
        }
    }
}
