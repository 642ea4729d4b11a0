//! Streaming-response metrics extractor

use super::decoder::Utf8ChunkDecoder;
use super::parser::SseLineParser;
use super::types::{ChatCompletionResponse, StreamEvent};
use super::utils::extract_fallback_from_error;
use crate::core::metrics::{Clock, MetricsSnapshot, StreamStatus};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fallback message when the gateway reports an error without one
pub const DEFAULT_ERROR_MESSAGE: &str = "Error calling LiteLLM gateway";

/// What `first_token_at` means for a non-streaming response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstTokenConvention {
    /// The first token "arrives" with the complete body: TTFT equals total time
    #[default]
    ResponseEnd,
    /// The first token is pinned to the request start: TTFT is zero
    RequestStart,
}

/// Consumes one response and maintains its [`MetricsSnapshot`].
///
/// The extractor is the only writer of its snapshot. Once the status is terminal
/// (completed, failed or cancelled) every further input is a no-op.
#[derive(Debug)]
pub struct StreamMetricsExtractor {
    clock: Arc<dyn Clock>,
    parser: SseLineParser,
    snapshot: MetricsSnapshot,
    status: StreamStatus,
    cancel: Option<CancellationToken>,
    first_token_convention: FirstTokenConvention,
}

impl StreamMetricsExtractor {
    /// Create an extractor for a request issued now
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self::starting_at(clock, started_at)
    }

    /// Create an extractor for a request issued at `started_at`
    pub fn starting_at(clock: Arc<dyn Clock>, started_at: Instant) -> Self {
        Self {
            clock,
            parser: SseLineParser::new(),
            snapshot: MetricsSnapshot::new(started_at),
            status: StreamStatus::Streaming,
            cancel: None,
            first_token_convention: FirstTokenConvention::default(),
        }
    }

    /// Tie the extractor to a cancellation signal
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Choose the non-streaming first-token convention
    pub fn with_first_token_convention(mut self, convention: FirstTokenConvention) -> Self {
        self.first_token_convention = convention;
        self
    }

    /// Feed one decoded chunk and apply the events of every line it completes
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        if !self.accepts_input() {
            return Vec::new();
        }

        let events = self.parser.push_chunk(chunk);
        self.apply_all(&events);
        events
    }

    /// Signal that the source is exhausted.
    ///
    /// A pending partial line is parsed first; if the terminator never arrived the stream
    /// completes at this moment anyway.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if !self.accepts_input() {
            return Vec::new();
        }

        let mut events = self.parser.finish();
        self.apply_all(&events);

        if !self.status.is_terminal() {
            warn!("Stream ended without [DONE] marker");
            let done = StreamEvent::Done;
            self.apply(&done);
            events.push(done);
        }
        events
    }

    /// Record a transport failure; returns `false` if the stream was already terminal
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.accepts_input() {
            return false;
        }

        let message = message.into();
        let now = self.clock.now();
        self.snapshot.mark_ended(now);
        if let Some(target) = extract_fallback_from_error(&message) {
            self.snapshot.record_fallback(&target);
        }

        error!("Request failed: {}", message);
        self.status = StreamStatus::Failed { message };
        true
    }

    /// Abandon the request; the snapshot is left as it is
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        debug!("Stream cancelled by caller");
        self.status = StreamStatus::Cancelled;
        true
    }

    /// Treat a complete response body as a one-delta stream.
    ///
    /// Emits a single `TextDelta` with the full message followed by `Done`, both stamped at
    /// the moment the body finished arriving.
    pub fn complete_non_streaming(&mut self, body: &ChatCompletionResponse) -> Vec<StreamEvent> {
        if !self.accepts_input() {
            return Vec::new();
        }

        if let Some(error) = &body.error {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
            self.fail(message);
            return Vec::new();
        }

        let now = self.clock.now();
        if let Some(model) = body.model.as_ref().filter(|model| !model.is_empty()) {
            self.snapshot.apply(
                &StreamEvent::ModelReported {
                    model: model.clone(),
                },
                now,
            );
        }
        if let Some(usage) = body.usage {
            self.snapshot.apply(&usage.into(), now);
        }

        let first_token_at = match self.first_token_convention {
            FirstTokenConvention::ResponseEnd => now,
            FirstTokenConvention::RequestStart => self.snapshot.started_at(),
        };
        self.snapshot.mark_first_token(first_token_at);

        let events = vec![
            StreamEvent::TextDelta {
                content: body.content().to_string(),
            },
            StreamEvent::Done,
        ];
        for event in &events {
            if self.snapshot.apply(event, now) {
                self.complete();
            }
        }
        events
    }

    /// Pull chunks from `source` until the stream terminates.
    ///
    /// Suspends only while awaiting the next chunk; every chunk is parsed and applied before
    /// the next one is requested. `on_event` sees each event after it has been applied.
    pub async fn consume<S, B, E>(
        &mut self,
        source: S,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> StreamStatus
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        tokio::pin!(source);
        let mut decoder = Utf8ChunkDecoder::new();
        let token = self.cancel.clone();

        while self.accepts_input() {
            let next = match &token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    next = source.next() => Some(next),
                },
                None => Some(source.next().await),
            };

            let Some(next) = next else {
                self.cancel();
                break;
            };

            match next {
                Some(Ok(bytes)) => {
                    let text = decoder.decode(bytes.as_ref());
                    for event in self.feed(&text) {
                        on_event(&event);
                    }
                }
                Some(Err(e)) => {
                    self.fail(format!("Stream read error: {}", e));
                }
                None => {
                    let tail = decoder.finish();
                    let mut events = self.feed(&tail);
                    events.extend(self.finish());
                    for event in events {
                        on_event(&event);
                    }
                }
            }
        }

        self.status.clone()
    }

    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn accumulated_text(&self) -> &str {
        self.snapshot.accumulated_text()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Data lines discarded so far
    pub fn unparseable_lines(&self) -> usize {
        self.parser.unparseable_lines()
    }

    /// Give up ownership of the snapshot and final status
    pub fn into_parts(self) -> (MetricsSnapshot, StreamStatus) {
        (self.snapshot, self.status)
    }

    /// Whether input may still mutate the snapshot; notices a raised cancellation signal
    fn accepts_input(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if self.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
            self.cancel();
            return false;
        }
        true
    }

    fn apply_all(&mut self, events: &[StreamEvent]) {
        for event in events {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: &StreamEvent) {
        let now = self.clock.now();
        if self.snapshot.apply(event, now) {
            self.complete();
        }
    }

    fn complete(&mut self) {
        self.status = StreamStatus::Completed;
        let unparseable = self.parser.unparseable_lines();
        if unparseable > 0 {
            warn!("Skipped {} unparseable data line(s)", unparseable);
        }
        info!(
            ttft_ms = self.snapshot.ttft().map(|d| d.as_millis() as u64),
            total_ms = self.snapshot.total_time().map(|d| d.as_millis() as u64),
            completion_tokens = self.snapshot.completion_tokens(),
            "Stream completed"
        );
    }
}
