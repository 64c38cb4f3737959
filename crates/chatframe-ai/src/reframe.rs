//! Chunk reframing: newline-delimited JSON in, SSE frames out
//!
//! The generation backend streams one JSON object per line, chunked wherever
//! the transport felt like it. The relay re-frames each object as an SSE
//! `data:` frame and translates the backend's `done` flag into a single
//! terminal sentinel frame, after which nothing else is emitted.

use futures::{Stream, StreamExt, pin_mut};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::line_buffer::LineBuffer;

/// Terminal sentinel payload marking normal completion of an exchange.
pub const DONE_SENTINEL: &str = "[DONE]";

const SSE_DATA_PREFIX: &str = "data: ";

/// One decoded unit of the backend's generation stream.
///
/// The backend attaches more fields (model, timings, context); only the text
/// fragment and the completion flag travel onward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenEvent {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// One outbound frame of the relay stream.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Token(TokenEvent),
    Done,
}

impl RelayFrame {
    /// Render this frame in SSE wire format.
    pub fn to_sse(&self) -> String {
        match self {
            RelayFrame::Token(event) => {
                let json = serde_json::to_string(event).unwrap_or_default();
                format!("{SSE_DATA_PREFIX}{json}\n\n")
            }
            RelayFrame::Done => format!("{SSE_DATA_PREFIX}{DONE_SENTINEL}\n\n"),
        }
    }

    /// Decode one wire-level line back into a frame.
    ///
    /// Returns `None` for lines that are not `data:` frames (SSE blank-line
    /// separators, comments) and for frames whose payload does not decode;
    /// the latter are logged and skipped rather than ending the exchange.
    pub fn from_sse_line(line: &str) -> Option<RelayFrame> {
        let data = line.strip_prefix(SSE_DATA_PREFIX)?;
        if data.trim() == DONE_SENTINEL {
            return Some(RelayFrame::Done);
        }
        match serde_json::from_str::<TokenEvent>(data) {
            Ok(event) => Some(RelayFrame::Token(event)),
            Err(error) => {
                warn!(%error, "skipping undecodable relay frame");
                None
            }
        }
    }
}

/// Parse one complete backend line, if it carries anything.
///
/// Blank lines yield nothing; malformed lines are logged and dropped so one
/// bad line never ends the stream. A `done` event maps to the sentinel even
/// when it carries a fragment: completion takes precedence.
fn parse_backend_line(line: &str) -> Option<RelayFrame> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<TokenEvent>(line) {
        Ok(event) if event.done => Some(RelayFrame::Done),
        Ok(event) => Some(RelayFrame::Token(event)),
        Err(error) => {
            warn!(%error, %line, "skipping malformed backend line");
            None
        }
    }
}

/// Re-frame a chunked NDJSON byte stream into ordered [`RelayFrame`]s.
///
/// Event order is preserved and the sentinel is emitted at most once, always
/// last. If the upstream errors or ends without a `done` event, the output
/// simply ends without a sentinel; nothing is synthesized.
pub fn reframe<S, B, E>(upstream: S) -> impl Stream<Item = RelayFrame>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    async_stream::stream! {
        pin_mut!(upstream);
        let mut lines = LineBuffer::new();

        while let Some(chunk) = upstream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    warn!(%error, "backend stream failed mid-exchange");
                    return;
                }
            };

            for line in lines.push(chunk.as_ref()) {
                if let Some(frame) = parse_backend_line(&line) {
                    let done = frame == RelayFrame::Done;
                    yield frame;
                    if done {
                        return;
                    }
                }
            }
        }

        // The backend closed; the residual may still hold one final object.
        if let Some(rest) = lines.finish() {
            if let Some(frame) = parse_backend_line(&rest) {
                yield frame;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::convert::Infallible;

    async fn reframe_chunks(chunks: Vec<&str>) -> Vec<RelayFrame> {
        let upstream = stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, Infallible>(c.as_bytes().to_vec())),
        );
        reframe(upstream).collect().await
    }

    fn token(text: &str) -> RelayFrame {
        RelayFrame::Token(TokenEvent {
            response: text.to_string(),
            done: false,
        })
    }

    #[tokio::test]
    async fn reframes_complete_lines() {
        let frames = reframe_chunks(vec![
            "{\"response\":\"Hel\",\"done\":false}\n{\"response\":\"lo\",\"done\":false}\n",
            "{\"done\":true}\n",
        ])
        .await;
        assert_eq!(frames, vec![token("Hel"), token("lo"), RelayFrame::Done]);
    }

    #[tokio::test]
    async fn chunk_boundaries_do_not_matter() {
        let body = "{\"response\":\"a\",\"done\":false}\n{\"response\":\"b\",\"done\":false}\n{\"done\":true}\n";
        let expected = reframe_chunks(vec![body]).await;
        for split in 1..body.len() {
            let (head, tail) = body.split_at(split);
            let frames = reframe_chunks(vec![head, tail]).await;
            assert_eq!(frames, expected, "split at {split}");
        }
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_not_fatal() {
        let frames = reframe_chunks(vec![
            "{\"response\":\"a\",\"done\":false}\nNOTJSON\n{\"response\":\"b\",\"done\":false}\n{\"done\":true}\n",
        ])
        .await;
        assert_eq!(frames, vec![token("a"), token("b"), RelayFrame::Done]);
    }

    #[tokio::test]
    async fn done_with_fragment_still_terminates() {
        let frames =
            reframe_chunks(vec!["{\"response\":\"tail\",\"done\":true}\n"]).await;
        assert_eq!(frames, vec![RelayFrame::Done]);
    }

    #[tokio::test]
    async fn nothing_emitted_after_done() {
        let frames = reframe_chunks(vec![
            "{\"done\":true}\n{\"response\":\"late\",\"done\":false}\n",
        ])
        .await;
        assert_eq!(frames, vec![RelayFrame::Done]);
    }

    #[tokio::test]
    async fn residual_without_trailing_newline_is_flushed() {
        let frames = reframe_chunks(vec!["{\"response\":\"a\",\"done\":false}\n{\"done\":true}"]).await;
        assert_eq!(frames, vec![token("a"), RelayFrame::Done]);
    }

    #[tokio::test]
    async fn stream_ending_without_done_emits_no_sentinel() {
        let frames = reframe_chunks(vec!["{\"response\":\"a\",\"done\":false}\n"]).await;
        assert_eq!(frames, vec![token("a")]);
    }

    #[tokio::test]
    async fn upstream_error_ends_stream_without_sentinel() {
        let upstream = stream::iter(vec![
            Ok("{\"response\":\"a\",\"done\":false}\n".as_bytes().to_vec()),
            Err("connection reset"),
        ]);
        let frames: Vec<_> = reframe(upstream).collect().await;
        assert_eq!(frames, vec![token("a")]);
    }

    #[test]
    fn sse_rendering_matches_wire_format() {
        assert_eq!(
            token("hi").to_sse(),
            "data: {\"response\":\"hi\",\"done\":false}\n\n"
        );
        assert_eq!(RelayFrame::Done.to_sse(), "data: [DONE]\n\n");
    }

    #[test]
    fn sse_line_decoding() {
        assert_eq!(
            RelayFrame::from_sse_line("data: {\"response\":\"hi\",\"done\":false}"),
            Some(token("hi"))
        );
        assert_eq!(RelayFrame::from_sse_line("data: [DONE]"), Some(RelayFrame::Done));
        assert_eq!(RelayFrame::from_sse_line(""), None);
        assert_eq!(RelayFrame::from_sse_line("data: NOTJSON"), None);
        assert_eq!(RelayFrame::from_sse_line(": keep-alive"), None);
    }
}
