//! Exchange state machine and stream consumer
//!
//! One [`Exchange`] covers one user message → one streamed assistant answer.
//! The consumer re-splits the wire bytes on line boundaries with its own
//! [`LineBuffer`] (the relay's buffer lives on the other side of the wire),
//! decodes each `data:` frame, and surfaces fragments in arrival order. An
//! end of stream without the terminal sentinel is an aborted exchange, never
//! a silently completed one.

use std::collections::VecDeque;

use anyhow::bail;
use chatframe_ai::{LineBuffer, RelayFrame};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::Value;
use tracing::debug;

/// Lifecycle of one exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExchangePhase {
    /// Prepared but not yet sent
    #[default]
    Idle,
    /// Request sent, no bytes received yet
    Sending,
    /// Receiving and accumulating fragments
    Streaming,
    /// Terminal sentinel observed
    Completed,
    /// Connection error, unexpected close, or user cancel
    Aborted,
}

/// One observed step of an exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeEvent {
    /// A token fragment, to be appended to the in-progress answer
    Fragment(String),
    /// Terminal sentinel: the answer is complete
    Completed,
    /// The stream ended without the sentinel
    Aborted(String),
}

/// One chat exchange against the relay.
pub struct Exchange {
    http: reqwest::Client,
    url: String,
    payload: Value,
    phase: ExchangePhase,
    body: Option<BoxStream<'static, reqwest::Result<bytes::Bytes>>>,
    lines: LineBuffer,
    queued: VecDeque<ExchangeEvent>,
}

impl Exchange {
    pub(crate) fn new(http: reqwest::Client, url: String, payload: Value) -> Self {
        Self {
            http,
            url,
            payload,
            phase: ExchangePhase::Idle,
            body: None,
            lines: LineBuffer::new(),
            queued: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    /// Submit the conversation and open the response stream.
    ///
    /// A connection failure or a non-success status aborts the exchange
    /// before any fragment is produced.
    pub async fn send(&mut self) -> anyhow::Result<()> {
        self.phase = ExchangePhase::Sending;

        let response = match self.http.post(&self.url).json(&self.payload).send().await {
            Ok(response) => response,
            Err(error) => {
                self.phase = ExchangePhase::Aborted;
                return Err(error.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.phase = ExchangePhase::Aborted;
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            bail!("relay refused the exchange: {message}");
        }

        self.body = Some(response.bytes_stream().boxed());
        Ok(())
    }

    /// Wait for the next event of this exchange.
    ///
    /// Reads are strictly serialized: one chunk is taken from the wire at a
    /// time and its fragments are handed out in arrival order. Returns
    /// `None` once the exchange has reached a terminal phase.
    pub async fn next_event(&mut self) -> Option<ExchangeEvent> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(self.observe(event));
            }

            if matches!(
                self.phase,
                ExchangePhase::Idle | ExchangePhase::Completed | ExchangePhase::Aborted
            ) {
                return None;
            }

            let body = self.body.as_mut()?;
            match body.next().await {
                Some(Ok(chunk)) => {
                    if self.phase == ExchangePhase::Sending {
                        self.phase = ExchangePhase::Streaming;
                    }
                    for line in self.lines.push(&chunk) {
                        match RelayFrame::from_sse_line(&line) {
                            Some(RelayFrame::Done) => {
                                // The sentinel closes the message; anything
                                // after it is not accepted.
                                self.queued.push_back(ExchangeEvent::Completed);
                                break;
                            }
                            Some(RelayFrame::Token(event)) => {
                                self.queued.push_back(ExchangeEvent::Fragment(event.response));
                            }
                            None => {}
                        }
                    }
                }
                Some(Err(error)) => {
                    debug!(%error, "exchange stream failed");
                    self.queued
                        .push_back(ExchangeEvent::Aborted(format!("connection error: {error}")));
                }
                None => {
                    let residual = self
                        .lines
                        .finish()
                        .and_then(|rest| RelayFrame::from_sse_line(&rest));
                    match residual {
                        Some(RelayFrame::Done) => {
                            self.queued.push_back(ExchangeEvent::Completed);
                        }
                        Some(RelayFrame::Token(event)) => {
                            self.queued.push_back(ExchangeEvent::Fragment(event.response));
                            self.queued.push_back(ExchangeEvent::Aborted(
                                "stream closed before completion".to_string(),
                            ));
                        }
                        None => {
                            self.queued.push_back(ExchangeEvent::Aborted(
                                "stream closed before completion".to_string(),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Abort the exchange and release the underlying connection.
    pub fn cancel(&mut self) {
        self.queued.clear();
        self.body = None;
        self.phase = ExchangePhase::Aborted;
    }

    fn observe(&mut self, event: ExchangeEvent) -> ExchangeEvent {
        match &event {
            ExchangeEvent::Fragment(_) => {}
            ExchangeEvent::Completed => {
                self.phase = ExchangePhase::Completed;
                self.body = None;
            }
            ExchangeEvent::Aborted(_) => {
                self.phase = ExchangePhase::Aborted;
                self.body = None;
            }
        }
        event
    }
}
