//! Buffered decoding reader
//!
//! Reads markup from any source implementing Read, decoding it to text in
//! chunks of at most the buffer size.

use super::decoder::ChunkDecoder;
use super::switch_encoding;
use super::TextSource;
use crate::error::Result;
use crate::options::{ParseOptions, DEFAULT_ENCODING_SNIFF_LIMIT};
use encoding_rs::{Encoding, UTF_8};
use std::io::{ErrorKind, Read};

/// Buffer size for reading chunks
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Text source over a byte reader
pub struct DecodingReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    decoder: ChunkDecoder,
    /// Stream start decoded again after an encoding switch
    replayed: Option<String>,
    eof: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Create a reader decoding UTF-8 unless the stream says otherwise
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE, UTF_8)
    }

    /// Create a reader using the buffer size and default encoding of `options`
    pub fn with_options(reader: R, options: &ParseOptions) -> Self {
        Self::build(
            reader,
            options.read_buffer_size,
            options.default_encoding,
            options.encoding_sniff_limit,
        )
    }

    /// Create a new reader with specified buffer capacity
    pub fn with_capacity(reader: R, capacity: usize, default_encoding: &'static Encoding) -> Self {
        Self::build(reader, capacity, default_encoding, DEFAULT_ENCODING_SNIFF_LIMIT)
    }

    fn build(reader: R, capacity: usize, default_encoding: &'static Encoding, replay_limit: usize) -> Self {
        DecodingReader {
            reader,
            buffer: vec![0u8; capacity.max(4)],
            decoder: ChunkDecoder::new(default_encoding, replay_limit),
            replayed: None,
            eof: false,
        }
    }

    /// The encoding currently used
    pub fn encoding(&self) -> &'static Encoding {
        self.decoder.encoding()
    }
}

impl<R: Read> TextSource for DecodingReader<R> {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        if let Some(text) = self.replayed.take() {
            return Ok(Some(text));
        }
        while !self.eof {
            let read = match self.reader.read(&mut self.buffer) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                self.eof = true;
                let tail = self.decoder.finish();
                return Ok((!tail.is_empty()).then_some(tail));
            }

            let text = self.decoder.decode(&self.buffer[..read]);
            // an empty result means only part of a character has arrived
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    fn change_encoding(&mut self, encoding: &'static Encoding) -> bool {
        self.replayed = switch_encoding(&mut self.decoder, encoding);
        self.replayed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<S: TextSource>(source: &mut S) -> Vec<String> {
        let mut chunks = vec![];
        while let Some(chunk) = source.next_chunk().unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn test_chunks_respect_capacity() {
        let data = "<root>content</root>";
        let mut reader = DecodingReader::with_capacity(Cursor::new(data), 8, UTF_8);
        let chunks = drain(&mut reader);
        assert!(chunks.iter().all(|c| c.len() <= 8));
        assert_eq!(chunks.concat(), data);
    }

    #[test]
    fn test_utf16_is_decoded() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<p>ü</p>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let mut reader = DecodingReader::new(Cursor::new(bytes));
        assert_eq!(drain(&mut reader).concat(), "<p>ü</p>");
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        let data = "ééééé".as_bytes().to_vec();
        let mut reader = DecodingReader::with_capacity(Cursor::new(data), 5, UTF_8);
        assert_eq!(drain(&mut reader).concat(), "ééééé");
    }

    #[test]
    fn test_change_encoding_replays_stream_start() {
        let mut reader = DecodingReader::new(Cursor::new(b"<p>caf\xE9</p>".to_vec()));
        assert_eq!(reader.next_chunk().unwrap().as_deref(), Some("<p>caf\u{FFFD}</p>"));
        assert!(reader.change_encoding(encoding_rs::WINDOWS_1252));
        assert_eq!(drain(&mut reader).concat(), "<p>caf\u{E9}</p>");
        assert_eq!(reader.encoding(), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_exhausted_reader_keeps_returning_none() {
        let mut reader = DecodingReader::new(Cursor::new(""));
        assert_eq!(reader.next_chunk().unwrap(), None);
        assert_eq!(reader.next_chunk().unwrap(), None);
    }
}
