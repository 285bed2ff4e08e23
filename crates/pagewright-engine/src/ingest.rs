//! Event-stream ingestion.
//!
//! [`StreamIngestor`] turns the relay's raw byte stream into ordered content
//! deltas. Bytes are buffered until a newline so that neither a line nor a
//! multi-byte character is ever split across two reads.
//!
//! ```text
//! data: {"content":"<html>"}   -> Delta("<html>")
//! : keep-alive                  -> ignored
//! data: {not json}              -> skipped
//! data: [DONE]                  -> End
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use serde::Deserialize;

/// Marker that prefixes every event line.
pub const EVENT_MARKER: &str = "data:";

/// Payload that terminates the stream.
pub const SENTINEL: &str = "[DONE]";

/// One event produced by the ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant text.
    Delta(String),
    /// The backend signalled (or the stream implied) that no more deltas follow.
    End,
    /// The underlying byte stream failed.
    Error(IngestError),
}

/// Errors surfaced by the ingestor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// Reading the underlying byte stream failed.
    #[error("stream read failed: {0}")]
    Read(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    content: Option<String>,
}

/// What a single complete line means.
#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    Ignored,
    Malformed,
    Delta(String),
    End,
}

/// Classify one complete line (without its trailing newline).
fn classify_line(line: &str) -> LineKind {
    let Some(payload) = line.strip_prefix(EVENT_MARKER) else {
        return LineKind::Ignored;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload == SENTINEL {
        return LineKind::End;
    }

    match serde_json::from_str::<Envelope>(payload) {
        Ok(Envelope {
            content: Some(content),
        }) if !content.is_empty() => LineKind::Delta(content),
        Ok(_) => LineKind::Ignored,
        Err(_) => LineKind::Malformed,
    }
}

/// Lazy, single-pass reader of an event stream.
///
/// Once `End` or `Error` has been yielded the ingestor is exhausted and
/// returns `None` forever; it cannot be replayed.
pub struct StreamIngestor<S> {
    inner: S,
    /// Bytes after the last complete line.
    partial: Vec<u8>,
    /// Events parsed but not yet yielded.
    ready: VecDeque<StreamEvent>,
    /// Set once a terminal event has been queued.
    finished: bool,
    malformed_lines: usize,
}

impl<S> StreamIngestor<S> {
    /// Wrap a byte stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            partial: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
            malformed_lines: 0,
        }
    }

    /// Number of lines skipped because their payload failed to parse.
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Whether a terminal event has been produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        match classify_line(&line) {
            LineKind::Ignored => {}
            LineKind::Malformed => {
                self.malformed_lines += 1;
                tracing::debug!(line = %line, "skipping malformed event payload");
            }
            LineKind::Delta(text) => self.ready.push_back(StreamEvent::Delta(text)),
            LineKind::End => self.finish(StreamEvent::End),
        }
    }

    /// Split buffered bytes on newlines and queue events for complete lines.
    ///
    /// Bytes before `scan_from` are known to hold no newline. The consumed
    /// lines are removed from the buffer once, after the pass.
    fn drain_lines(&mut self, scan_from: usize) {
        let buf = std::mem::take(&mut self.partial);
        let mut start = 0;
        let mut scan = scan_from;
        while !self.finished {
            let Some(offset) = buf[scan..].iter().position(|&b| b == b'\n') else {
                break;
            };
            let end = scan + offset;
            self.handle_line(&buf[start..end]);
            start = end + 1;
            scan = start;
        }
        if !self.finished {
            self.partial = buf;
            self.partial.drain(..start);
        }
    }

    fn finish(&mut self, event: StreamEvent) {
        self.ready.push_back(event);
        self.finished = true;
        self.partial.clear();
    }
}

impl<S, E> Stream for StreamIngestor<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.ready.pop_front() {
                return Poll::Ready(Some(event));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let scanned = this.partial.len();
                    this.partial.extend_from_slice(&chunk);
                    this.drain_lines(scanned);
                }
                Poll::Ready(Some(Err(err))) => {
                    this.finish(StreamEvent::Error(IngestError::Read(err.to_string())));
                }
                Poll::Ready(None) => {
                    // A last line without trailing newline still counts.
                    if !this.partial.is_empty() {
                        let rest = std::mem::take(&mut this.partial);
                        this.handle_line(&rest);
                    }
                    if !this.finished {
                        this.finish(StreamEvent::End);
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
