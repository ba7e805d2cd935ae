//! Readers - decoded text from byte sources
//!
//! The streaming driver consumes text, not bytes. Readers decode a byte
//! stream chunk by chunk and can switch encoding mid-stream when the
//! document declares one.

mod buffered;
mod decoder;

#[cfg(feature = "async")]
mod async_reader;

pub use buffered::{DecodingReader, DEFAULT_BUFFER_SIZE};
pub use decoder::{ChunkDecoder, Switch};

#[cfg(feature = "async")]
pub use async_reader::AsyncDecodingReader;

use crate::error::Result;
use encoding_rs::Encoding;

/// Source of decoded text chunks
pub trait TextSource {
    /// Next chunk of text, or None at end of input
    fn next_chunk(&mut self) -> Result<Option<String>>;

    /// Decode the rest of the input with `encoding`. Returns true when the
    /// source went back to the start of the stream: the next chunk then
    /// repeats all text handed out so far, decoded again.
    fn change_encoding(&mut self, encoding: &'static Encoding) -> bool;
}

/// Apply a declared encoding to `decoder`, returning the replayed text
fn switch_encoding(decoder: &mut ChunkDecoder, encoding: &'static Encoding) -> Option<String> {
    match decoder.change_encoding(encoding) {
        Switch::Replayed(text) => {
            tracing::debug!(encoding = encoding.name(), replayed = text.len(), "stream start decoded again");
            Some(text)
        }
        Switch::Continued => {
            tracing::debug!(encoding = encoding.name(), "switched reader encoding for the rest of the stream");
            None
        }
        Switch::Ignored if decoder.encoding() != encoding => {
            tracing::debug!(
                encoding = encoding.name(),
                fixed = decoder.encoding().name(),
                "declared encoding ignored, fixed by byte order mark"
            );
            None
        }
        Switch::Ignored => None,
    }
}
