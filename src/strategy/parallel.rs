//! Parallel Batch Parsing
//!
//! Uses Rayon to parse independent documents at once. Every parse keeps its
//! own frame stack; only the tag registry is shared, and it is safe for
//! concurrent lookup-or-insert.

use crate::dom::Document;
use crate::options::ParseOptions;
use rayon::prelude::*;

/// Parse every input in parallel with one shared registry.
///
/// Results come back in input order. When `options` carries no registry of
/// the right dialect, one is created for the whole batch.
#[tracing::instrument(skip_all, fields(documents = inputs.len()))]
pub fn parse_parallel<'a, S>(inputs: &'a [S], options: &ParseOptions) -> Vec<Document<'a>>
where
    S: AsRef<str> + Sync,
{
    let options = ParseOptions {
        registry: Some(options.registry()),
        ..options.clone()
    };
    inputs
        .par_iter()
        .map(|input| Document::parse(input.as_ref(), &options))
        .collect()
}
