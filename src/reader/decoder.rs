//! Incremental byte-to-text decoding shared by the sync and async readers

use crate::core::encoding;
use encoding_rs::{CoderResult, Decoder, Encoding};

/// What a requested encoding change did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Switch {
    /// The stream fixed its own encoding, or it is already in use
    Ignored,
    /// Bytes read from now on use the new encoding
    Continued,
    /// Everything read so far was decoded again; the text restarts from
    /// the beginning of the stream
    Replayed(String),
}

/// Decodes a byte stream chunk by chunk, holding back incomplete
/// characters until their remaining bytes arrive.
///
/// The first bytes of the stream are recorded so that a declaration found
/// near the start can have them decoded again with the declared encoding.
pub struct ChunkDecoder {
    /// Created from the first bytes seen
    decoder: Option<Decoder>,
    encoding: &'static Encoding,
    /// Set when a BOM or the UTF-16 pattern fixed the encoding
    locked: bool,
    /// Bytes read so far; dropped once `replay_limit` is reached
    replay: Option<Vec<u8>>,
    replay_limit: usize,
    finished: bool,
}

impl ChunkDecoder {
    /// Create a decoder that can replay at least the first `replay_limit`
    /// bytes of the stream
    pub fn new(default_encoding: &'static Encoding, replay_limit: usize) -> Self {
        ChunkDecoder {
            decoder: None,
            encoding: default_encoding,
            locked: false,
            replay: Some(Vec::new()),
            replay_limit,
            finished: false,
        }
    }

    /// The encoding currently used
    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Decode the next bytes of the stream
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        if self.decoder.is_none() {
            let decoder = match encoding::detect(bytes) {
                Some(detected) => {
                    self.encoding = detected.encoding;
                    self.locked = detected.locked;
                    detected.encoding.new_decoder_with_bom_removal()
                }
                None => self.encoding.new_decoder(),
            };
            self.decoder = Some(decoder);
        }
        self.record(bytes);

        match self.decoder.as_mut() {
            Some(decoder) => decode_into(decoder, bytes, false),
            None => String::new(),
        }
    }

    /// Flush whatever the decoder still holds at end of stream
    pub fn finish(&mut self) -> String {
        self.finished = true;
        match self.decoder.as_mut() {
            Some(decoder) => decode_into(decoder, &[], true),
            None => String::new(),
        }
    }

    /// Switch to `encoding` for the rest of the stream, replaying the
    /// recorded start of the stream while it is still available
    pub fn change_encoding(&mut self, encoding: &'static Encoding) -> Switch {
        if self.locked || encoding == self.encoding {
            return Switch::Ignored;
        }
        self.encoding = encoding;
        let mut decoder = encoding.new_decoder_without_bom_handling();

        let switch = match self.replay.take() {
            Some(bytes) => Switch::Replayed(decode_into(&mut decoder, &bytes, self.finished)),
            None => Switch::Continued,
        };
        self.decoder = Some(decoder);
        switch
    }

    fn record(&mut self, bytes: &[u8]) {
        if self.locked {
            self.replay = None;
        }
        let Some(replay) = self.replay.as_mut() else {
            return;
        };
        if replay.len() >= self.replay_limit {
            self.replay = None;
        } else {
            replay.extend_from_slice(bytes);
        }
    }
}

fn decode_into(decoder: &mut Decoder, bytes: &[u8], last: bool) -> String {
    let capacity = decoder
        .max_utf8_buffer_length(bytes.len())
        .unwrap_or(bytes.len() * 3 + 16);
    let mut out = String::with_capacity(capacity);
    let mut input = bytes;
    loop {
        let (result, read, _) = decoder.decode_to_string(input, &mut out, last);
        input = &input[read..];
        match result {
            CoderResult::InputEmpty => break,
            CoderResult::OutputFull => out.reserve(input.len() * 3 + 16),
        }
    }
    out
}
