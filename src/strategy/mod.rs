//! Parsing Drivers
//!
//! Ways of feeding input to the tree assembler beyond a single in-memory
//! string:
//! - Streaming: chunk-by-chunk assembly from readers, sync or async
//! - Parallel: batch parsing of independent documents with Rayon

pub mod parallel;
pub mod streaming;

pub use parallel::parse_parallel;
#[cfg(feature = "async")]
pub use streaming::{parse_async, parse_async_with_cancel};
pub use streaming::{parse_reader, parse_source, StreamParser};
