//! Server-Sent Events (SSE) streaming parser.
//!
//! The Gemini API streams replies as SSE when called with `alt=sse`.
//! [`SseDecoder`] holds the line-level state machine; [`sse_events`]
//! drives it over any byte stream and yields events lazily.

use futures_util::{stream, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio_util::bytes::Bytes;
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, if an `event:` field was present.
    pub event: Option<String>,
    /// The event data (JSON string for Gemini).
    pub data: String,
}

/// Incremental SSE line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    current_event: Option<String>,
    current_data: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator). Returns an event when a blank
    /// line closes one.
    pub fn push_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            let event = self.take_event();
            self.current_event = None;
            return event;
        }

        if let Some(event_type) = field_value(line, "event") {
            self.current_event = Some(event_type.to_string());
        } else if let Some(data) = field_value(line, "data") {
            if !self.current_data.is_empty() {
                self.current_data.push('\n');
            }
            self.current_data.push_str(data);
        }
        // id:, retry: and comments are ignored
        None
    }

    /// Flush an event left open at end of input.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.take_event()
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        if self.current_data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: self.current_event.take(),
            data: std::mem::take(&mut self.current_data),
        })
    }
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

type ByteLines<S> = Lines<BufReader<StreamReader<S, Bytes>>>;

struct EventSource<S> {
    lines: ByteLines<S>,
    decoder: SseDecoder,
    done: bool,
}

/// Decode a byte stream into SSE events.
///
/// Read errors end the stream with [`AiError::NetworkError`].
pub fn sse_events<S>(bytes: S) -> impl Stream<Item = Result<SseEvent, AiError>> + Send
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + Unpin + 'static,
{
    let source = EventSource {
        lines: BufReader::new(StreamReader::new(bytes)).lines(),
        decoder: SseDecoder::new(),
        done: false,
    };

    stream::unfold(source, |mut source| async move {
        if source.done {
            return None;
        }
        loop {
            match source.lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = source.decoder.push_line(&line) {
                        return Some((Ok(event), source));
                    }
                }
                Ok(None) => {
                    source.done = true;
                    return source.decoder.finish().map(|event| (Ok(event), source));
                }
                Err(e) => {
                    source.done = true;
                    return Some((Err(AiError::NetworkError(e.to_string())), source));
                }
            }
        }
    })
}

/// SSE events from a reqwest response body.
pub fn response_events(
    response: reqwest::Response,
) -> impl Stream<Item = Result<SseEvent, AiError>> + Send {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    sse_events(Box::pin(byte_stream))
}
