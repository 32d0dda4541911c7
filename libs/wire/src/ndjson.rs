//! Newline-delimited JSON framing for the deploy record stream
//!
//! The orchestrator writes one JSON-encoded [`LogResponse`] per line and
//! flushes each line as its own chunk. The decoder is incremental: feed it
//! arbitrary byte chunks and pop complete records as they become available.

use crate::{LogResponse, WireError};

/// Encode one record as a single NDJSON line, trailing newline included.
pub fn encode(record: &LogResponse) -> Result<String, WireError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Incremental NDJSON decoder.
///
/// Buffers partial input across chunk boundaries; a record is only yielded
/// once its terminating newline has arrived.
#[derive(Debug, Default)]
pub struct Decoder {
    buf: Vec<u8>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes to the decode buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete record, if one is buffered.
    pub fn next_record(&mut self) -> Result<Option<LogResponse>, WireError> {
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
                return Ok(None);
            };
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_slice(line)?));
        }
    }
}
