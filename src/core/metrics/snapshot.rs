//! Per-request latency and token accounting

use crate::core::streaming::StreamEvent;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Lifecycle state of one request's stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamStatus {
    /// Chunks are still being consumed
    Streaming,
    /// The terminator (or end of body) was reached
    Completed,
    /// The transport failed; carries a human-readable message
    Failed {
        /// Failure description
        message: String,
    },
    /// The caller abandoned the request
    Cancelled,
}

impl StreamStatus {
    /// Whether no further events will be applied
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamStatus::Streaming)
    }

    /// Failure message, if the stream failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StreamStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Mutable accumulator for a single request.
///
/// Milestones are write-once: `first_token_at` and `ended_at` keep the first value recorded,
/// and `accumulated_text` only ever grows.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    started_at: Instant,
    first_token_at: Option<Instant>,
    last_token_at: Option<Instant>,
    ended_at: Option<Instant>,
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    fallback_target: Option<String>,
    model_used: Option<String>,
    accumulated_text: String,
}

impl MetricsSnapshot {
    /// Start a fresh snapshot for a request issued at `started_at`
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            first_token_at: None,
            last_token_at: None,
            ended_at: None,
            prompt_tokens: None,
            completion_tokens: None,
            fallback_target: None,
            model_used: None,
            accumulated_text: String::new(),
        }
    }

    /// Apply one parsed event observed at `now`.
    ///
    /// Returns `true` when the event terminates the stream.
    pub fn apply(&mut self, event: &StreamEvent, now: Instant) -> bool {
        match event {
            StreamEvent::TextDelta { content } => {
                self.accumulated_text.push_str(content);
                self.mark_first_token(now);
                self.last_token_at = Some(now);
                false
            }
            StreamEvent::Usage {
                prompt_tokens,
                completion_tokens,
            } => {
                if let Some(prompt) = prompt_tokens {
                    self.prompt_tokens = Some(*prompt);
                }
                if let Some(completion) = completion_tokens {
                    self.completion_tokens = Some(*completion);
                }
                false
            }
            StreamEvent::FallbackNotice { target_model_id } => {
                self.record_fallback(target_model_id);
                false
            }
            StreamEvent::ModelReported { model } => {
                if self.model_used.is_none() {
                    self.model_used = Some(model.clone());
                }
                false
            }
            StreamEvent::Done => {
                self.mark_ended(now);
                true
            }
            StreamEvent::Unparseable => false,
        }
    }

    /// Record the first-token milestone unless one is already set
    pub(crate) fn mark_first_token(&mut self, at: Instant) -> bool {
        if self.first_token_at.is_some() {
            return false;
        }
        self.first_token_at = Some(at);
        true
    }

    /// Record the end milestone unless one is already set
    pub(crate) fn mark_ended(&mut self, at: Instant) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        self.ended_at = Some(at);
        true
    }

    /// Record a fallback target; the first one wins
    pub(crate) fn record_fallback(&mut self, target: &str) {
        if self.fallback_target.is_none() {
            self.fallback_target = Some(target.to_string());
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn first_token_at(&self) -> Option<Instant> {
        self.first_token_at
    }

    pub fn last_token_at(&self) -> Option<Instant> {
        self.last_token_at
    }

    pub fn ended_at(&self) -> Option<Instant> {
        self.ended_at
    }

    pub fn prompt_tokens(&self) -> Option<u32> {
        self.prompt_tokens
    }

    pub fn completion_tokens(&self) -> Option<u32> {
        self.completion_tokens
    }

    pub fn fallback_target(&self) -> Option<&str> {
        self.fallback_target.as_deref()
    }

    pub fn model_used(&self) -> Option<&str> {
        self.model_used.as_deref()
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    /// Time to first token
    pub fn ttft(&self) -> Option<Duration> {
        self.first_token_at
            .map(|first| first.saturating_duration_since(self.started_at))
    }

    /// Request start to end of stream
    pub fn total_time(&self) -> Option<Duration> {
        self.ended_at
            .map(|ended| ended.saturating_duration_since(self.started_at))
    }

    /// First token to end of stream
    pub fn generation_time(&self) -> Option<Duration> {
        match (self.first_token_at, self.ended_at) {
            (Some(first), Some(ended)) => Some(ended.saturating_duration_since(first)),
            _ => None,
        }
    }

    /// Prompt plus completion tokens, when both are known
    pub fn total_tokens(&self) -> Option<u32> {
        Some(self.prompt_tokens?.saturating_add(self.completion_tokens?))
    }

    /// Completion tokens per second of generation time
    pub fn tokens_per_second(&self) -> Option<f64> {
        let tokens = self.completion_tokens?;
        let seconds = self.generation_time()?.as_secs_f64();
        if seconds > 0.0 {
            Some(tokens as f64 / seconds)
        } else {
            None
        }
    }

    /// Flatten into a serializable summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            ttft_ms: self.ttft().map(as_millis),
            total_time_ms: self.total_time().map(as_millis),
            generation_time_ms: self.generation_time().map(as_millis),
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens(),
            tokens_per_second: self.tokens_per_second(),
            model_used: self.model_used.clone(),
            fallback_target: self.fallback_target.clone(),
        }
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serializable view of a [`MetricsSnapshot`], durations in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub ttft_ms: Option<u64>,
    pub total_time_ms: Option<u64>,
    pub generation_time_ms: Option<u64>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub tokens_per_second: Option<f64>,
    pub model_used: Option<String>,
    pub fallback_target: Option<String>,
}
