//! Input generators for property-based testing
//!
//! Documents are stitched together from markup fragments, so generated
//! inputs hit tag boundaries, broken constructs and raw-content tags far
//! more often than random strings would.
#![allow(clippy::expect_used)]
use proptest::prelude::*;

/// One piece of markup, well formed or not
pub fn markup_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec![
            "<div>", "</div>", "<p class=\"x\">", "</p>", "<span>", "</span>",
            "<b>", "</b>", "<i>", "</i>", "<a href=\"x>y\">", "</a>",
            "<br>", "<img src='a.png'/>", "<input disabled>",
            "<script>", "</script>", "<style>", "</style>",
            "<!-- note -->", "<!--", "-->", "<![CDATA[a<b]]>", "<![CDATA[",
            "<?pi data?>", "<!DOCTYPE html>", "<Ns:Item>", "</Ns:Item>",
        ])
        .prop_map(|s| s.to_string()),
        2 => prop::sample::select(vec!["<", ">", "</", "/>", "=", "\"", "'", "<1>", "< b>", "&amp;", "&#233;", "&bogus;"])
            .prop_map(|s| s.to_string()),
        3 => prop::string::string_regex("[a-zA-Z0-9 .,\n]{1,10}").expect("Failed to create text strategy"),
        1 => prop::string::string_regex("[éü€😀 ]{1,4}").expect("Failed to create unicode strategy"),
    ]
}

/// A document of arbitrary fragments, usually malformed
pub fn markup_document() -> impl Strategy<Value = String> {
    prop::collection::vec(markup_fragment(), 0..32).prop_map(|fragments| fragments.concat())
}

/// A document plus sorted split points, all on character boundaries
pub fn chunked_document() -> impl Strategy<Value = (String, Vec<usize>)> {
    (markup_document(), prop::collection::vec(any::<usize>(), 0..12)).prop_map(|(input, seeds)| {
        let mut points: Vec<usize> = seeds
            .into_iter()
            .map(|seed| {
                let mut at = seed % (input.len() + 1);
                while !input.is_char_boundary(at) {
                    at -= 1;
                }
                at
            })
            .collect();
        points.sort_unstable();
        points.dedup();
        (input, points)
    })
}

fn attribute() -> impl Strategy<Value = String> {
    prop::sample::select(vec![" id=\"a\"", " hidden", " class='x y'", " title=\"say 'hi'\"", " data-v=1"])
        .prop_map(|s| s.to_string())
}

/// A document in which every tag is closed in order
pub fn well_formed_document() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        3 => prop::string::string_regex("[a-zA-Z0-9 .,]{1,12}").expect("Failed to create text strategy"),
        1 => Just("<br>".to_string()),
        1 => Just("<!-- note -->".to_string()),
    ];
    let tree = leaf.prop_recursive(4, 48, 4, |inner| {
        (
            prop::sample::select(vec!["div", "span", "b", "i", "section", "em", "custom-tag"]),
            prop::option::of(attribute()),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, attribute, children)| {
                format!("<{name}{}>{}</{name}>", attribute.unwrap_or_default(), children.concat())
            })
    });
    prop::collection::vec(tree, 1..4).prop_map(|trees| trees.concat())
}
