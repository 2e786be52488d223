//! NDJSON re-framing for streamed replies.
//!
//! The transport hands over byte chunks of arbitrary size. [`NdjsonDecoder`]
//! buffers them and yields one [`Response`] per complete top-level JSON
//! object, holding back any partial tail until more bytes arrive. A chunk
//! boundary may fall anywhere, including inside a multi-byte UTF-8 sequence.
//!
//! Callers of the streaming operations receive the frames through a
//! [`ResponseSink`], which can stop the stream early.

use serde_json::Deserializer;

use crate::error::{Error, Result};
use crate::json::Object;
use crate::mode::MessageMode;
use crate::response::Response;

/// What a sink wants after handling a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamControl {
    /// Keep reading.
    #[default]
    Continue,
    /// Close the connection; no further frames are delivered.
    Stop,
}

impl StreamControl {
    /// Whether the stream should be closed.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// `true` continues, `false` stops.
impl From<bool> for StreamControl {
    fn from(keep_going: bool) -> Self {
        if keep_going { Self::Continue } else { Self::Stop }
    }
}

impl From<()> for StreamControl {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

/// Receives streamed frames in server order, on the calling thread.
pub trait ResponseSink {
    /// Handle one frame.
    fn on_event(&mut self, response: Response) -> StreamControl;
}

impl<F, C> ResponseSink for F
where
    F: FnMut(Response) -> C,
    C: Into<StreamControl>,
{
    fn on_event(&mut self, response: Response) -> StreamControl {
        self(response).into()
    }
}

/// Incremental decoder for newline-delimited JSON objects.
#[derive(Debug)]
pub struct NdjsonDecoder {
    mode: MessageMode,
    buffer: Vec<u8>,
    rejected: Vec<String>,
}

impl NdjsonDecoder {
    /// Create a decoder tagging every frame with `mode`.
    #[must_use]
    pub const fn new(mode: MessageMode) -> Self {
        Self {
            mode,
            buffer: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Bytes currently held back as a partial frame.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Append a chunk and return every frame it completes.
    ///
    /// Never fails: an incomplete object stays buffered. A complete line that
    /// is not a JSON object is dropped with a warning and reported by
    /// [`finish`](Self::finish).
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Response> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        loop {
            consumed += leading_whitespace(&self.buffer[consumed..]);
            let rest = &self.buffer[consumed..];
            if rest.is_empty() {
                break;
            }

            let mut objects = Deserializer::from_slice(rest).into_iter::<Object>();
            match objects.next() {
                Some(Ok(object)) => {
                    let end = objects.byte_offset();
                    let raw = String::from_utf8_lossy(&rest[..end]).trim().to_owned();
                    frames.push(Response::from_object(raw, object, self.mode));
                    consumed += end;
                }
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    // Wait for the line to end before giving up on it.
                    let Some(newline) = rest.iter().position(|&b| b == b'\n') else {
                        break;
                    };
                    let line = String::from_utf8_lossy(&rest[..newline]).trim().to_owned();
                    tracing::warn!(error = %e, line = %line, "dropping malformed stream line");
                    self.rejected.push(line);
                    consumed += newline + 1;
                }
                None => break,
            }
        }

        self.buffer.drain(..consumed);
        frames
    }

    /// Flush the decoder at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] when non-whitespace bytes remain that
    /// do not form a JSON object, or when a malformed line was dropped
    /// earlier in the stream.
    pub fn finish(mut self) -> Result<Vec<Response>> {
        let frames = self.feed(&[]);
        if !self.buffer.iter().all(u8::is_ascii_whitespace) {
            let residue = String::from_utf8_lossy(&self.buffer).trim().to_owned();
            return Err(Error::invalid_json("incomplete JSON at end of stream", residue));
        }
        if let Some(line) = self.rejected.pop() {
            return Err(Error::invalid_json("malformed line in stream", line));
        }
        Ok(frames)
    }
}

fn leading_whitespace(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len())
}
