//! Async decoding reader over tokio::io::AsyncRead

use super::buffered::DEFAULT_BUFFER_SIZE;
use super::decoder::ChunkDecoder;
use super::switch_encoding;
use crate::error::Result;
use crate::options::{ParseOptions, DEFAULT_ENCODING_SNIFF_LIMIT};
use encoding_rs::{Encoding, UTF_8};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Async counterpart of [`DecodingReader`](super::DecodingReader)
pub struct AsyncDecodingReader<R> {
    reader: R,
    buffer: Vec<u8>,
    decoder: ChunkDecoder,
    /// Stream start decoded again after an encoding switch
    replayed: Option<String>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> AsyncDecodingReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE, UTF_8)
    }

    pub fn with_options(reader: R, options: &ParseOptions) -> Self {
        Self::build(
            reader,
            options.read_buffer_size,
            options.default_encoding,
            options.encoding_sniff_limit,
        )
    }

    pub fn with_capacity(reader: R, capacity: usize, default_encoding: &'static Encoding) -> Self {
        Self::build(reader, capacity, default_encoding, DEFAULT_ENCODING_SNIFF_LIMIT)
    }

    fn build(reader: R, capacity: usize, default_encoding: &'static Encoding, replay_limit: usize) -> Self {
        AsyncDecodingReader {
            reader,
            buffer: vec![0u8; capacity.max(4)],
            decoder: ChunkDecoder::new(default_encoding, replay_limit),
            replayed: None,
            eof: false,
        }
    }

    /// Next decoded chunk, or None at end of stream
    pub async fn next_chunk(&mut self) -> Result<Option<String>> {
        if let Some(text) = self.replayed.take() {
            return Ok(Some(text));
        }
        while !self.eof {
            let read = self.reader.read(&mut self.buffer).await?;
            if read == 0 {
                self.eof = true;
                let tail = self.decoder.finish();
                return Ok((!tail.is_empty()).then_some(tail));
            }

            let text = self.decoder.decode(&self.buffer[..read]);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    /// Switch the decoder for the rest of the stream. Returns true when
    /// the stream start was decoded again and will be handed out anew.
    pub fn change_encoding(&mut self, encoding: &'static Encoding) -> bool {
        self.replayed = switch_encoding(&mut self.decoder, encoding);
        self.replayed.is_some()
    }
}
