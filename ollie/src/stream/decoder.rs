//! Byte-to-line decoder.
//!
//! Chunks from the transport arrive at arbitrary boundaries, including the
//! middle of a multi-byte UTF-8 character. The decoder keeps raw bytes until a
//! full line is available and only then decodes it, so a character split
//! across chunks is reassembled before it is ever interpreted. `\n` (0x0A)
//! never occurs inside a multi-byte UTF-8 sequence, which makes splitting on
//! the raw byte safe.

/// Incremental splitter of a byte stream into text lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Bytes received but not yet returned as a line.
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
}

impl LineDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes, in order.
    ///
    /// Lines are returned without their terminator; a trailing `\r` is
    /// stripped as well.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut cursor = self.scanned;
        while let Some(offset) = self.buffer[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
            cursor = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        tracing::trace!(
            chunk_len = chunk.len(),
            lines = lines.len(),
            pending = self.buffer.len(),
            "decoded chunk"
        );
        lines
    }

    /// Flush the remainder at end of input.
    ///
    /// Returns `None` when nothing but whitespace is left.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let line = decode_line(&rest);
        if line.trim().is_empty() { None } else { Some(line) }
    }

    /// Number of buffered bytes that do not yet form a complete line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
