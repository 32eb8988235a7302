//! Streaming response protocol.
//!
//! Long-running endpoints answer with newline-delimited JSON: one complete
//! document per line, the last one carrying a terminal marker. This module
//! turns the raw chunked body into typed messages:
//!
//! - [`LineDecoder`] splits bytes into lines, tolerant of characters split
//!   across chunks
//! - [`decode_ndjson`] parses lines into messages, skipping malformed ones
//! - [`until_terminal`] and [`expect_single`] enforce how a stream must end

mod decoder;
mod message;
mod ndjson;

pub use decoder::LineDecoder;
pub use message::{StreamMessage, error_message, is_terminal_document};
pub use ndjson::{MessageStream, decode_ndjson, expect_single, parse_line, until_terminal};
