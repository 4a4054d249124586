//! SSE streaming parser for chat completion deltas.
//!
//! [`SseDecoder`] turns raw response bytes into `choices[0].delta.content`
//! fragments, in arrival order, regardless of where the network splits the
//! stream. [`DeltaStream`] wraps it as a `futures::Stream` over a byte stream.
//!
//! Framing rules:
//! - lines end at `\n`; one trailing `\r` is dropped
//! - blank lines and `:` comments are skipped, as is anything without the
//!   `data: ` prefix
//! - `data: [DONE]` finishes the stream; later lines are never interpreted
//! - a `data:` payload that is not valid JSON is pushed back onto the front of
//!   the buffer and extraction waits for more bytes
//! - at end of input the residue gets one last pass without pushback, so a
//!   malformed trailing line is dropped

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ChatClientError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// What a single SSE line amounts to.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    /// Comment, blank, or non-data line
    Skip,
    /// The `[DONE]` sentinel
    Done,
    /// A parsed frame, with its content if it carried any
    Frame(Option<String>),
    /// A `data:` line whose payload did not parse
    Malformed,
}

fn classify(line: &str) -> Line {
    if line.starts_with(':') || line.trim().is_empty() {
        return Line::Skip;
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Line::Skip;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Line::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(frame) => Line::Frame(
            frame
                .pointer("/choices/0/delta/content")
                .and_then(Value::as_str)
                .filter(|content| !content.is_empty())
                .map(str::to_owned),
        ),
        Err(_) => Line::Malformed,
    }
}

/// Incremental decoder for one chat completion stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Decoded text not yet consumed as complete lines
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    pending: Vec<u8>,
    /// Set once `[DONE]` has been seen
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one network chunk and return the deltas it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.finished {
            // Keep draining the transport, but nothing after [DONE] counts.
            return Vec::new();
        }
        self.decode(chunk);

        let mut deltas = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let raw: String = self.buffer.drain(..=newline).collect();
            let line = raw[..newline].strip_suffix('\r').unwrap_or(&raw[..newline]);

            match classify(line) {
                Line::Skip | Line::Frame(None) => {}
                Line::Frame(Some(content)) => deltas.push(content),
                Line::Done => {
                    debug!("stream signalled [DONE]");
                    self.finished = true;
                    self.buffer.clear();
                    break;
                }
                Line::Malformed => {
                    trace!(len = line.len(), "incomplete frame, waiting for more bytes");
                    let mut restored = String::with_capacity(line.len() + 1 + self.buffer.len());
                    restored.push_str(line);
                    restored.push('\n');
                    restored.push_str(&self.buffer);
                    self.buffer = restored;
                    break;
                }
            }
        }
        deltas
    }

    /// Flush whatever is left once the transport has ended.
    pub fn finish(mut self) -> Vec<String> {
        if self.finished {
            return Vec::new();
        }
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }

        let mut deltas = Vec::new();
        for raw in self.buffer.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            match classify(line) {
                Line::Frame(Some(content)) => deltas.push(content),
                Line::Done => break,
                Line::Malformed => {
                    debug!(len = line.len(), "dropping malformed trailing frame");
                }
                Line::Skip | Line::Frame(None) => {}
            }
        }
        deltas
    }

    /// Append a chunk to the text buffer, holding back a split UTF-8 tail.
    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Byte stream feeding a [`DeltaStream`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatClientError>> + Send>>;

/// Stream adapter that converts raw SSE bytes into delta fragments.
///
/// Yields `Ok(delta)` per content-bearing frame, at most one `Err` (after
/// which it ends), and ends cleanly when the transport closes.
pub struct DeltaStream {
    inner: ByteStream,
    decoder: Option<SseDecoder>,
    ready: VecDeque<String>,
}

impl DeltaStream {
    pub fn new(
        byte_stream: impl Stream<Item = Result<Bytes, ChatClientError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            decoder: Some(SseDecoder::new()),
            ready: VecDeque::new(),
        }
    }
}

impl Stream for DeltaStream {
    type Item = Result<String, ChatClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(delta) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(delta)));
            }

            let Some(decoder) = this.decoder.as_mut() else {
                return Poll::Ready(None);
            };

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.ready.extend(decoder.feed(&bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.decoder = None;
                    this.ready.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    if let Some(decoder) = this.decoder.take() {
                        this.ready.extend(decoder.finish());
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
