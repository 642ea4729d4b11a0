//! SDK data types

use crate::core::metrics::{HistoryEntry, MetricsSnapshot, MetricsSummary, StreamStatus};
use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: Role,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// User message with the given text
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model
    pub model: String,
    /// Messages
    pub messages: Vec<ChatMessage>,
    /// Whether to request an SSE stream
    pub stream: bool,
}

impl ChatRequest {
    /// Single-prompt request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, stream: bool) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            stream,
        }
    }

    /// Text of the last user message
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

/// Result of one request, whatever way it ended
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// Model that was requested
    pub model: String,
    /// Prompt that was sent
    pub prompt: String,
    /// Final metrics
    pub snapshot: MetricsSnapshot,
    /// How the stream ended
    pub status: StreamStatus,
}

impl RequestOutcome {
    /// Response text accumulated before the stream ended
    pub fn text(&self) -> &str {
        self.snapshot.accumulated_text()
    }

    pub fn is_success(&self) -> bool {
        self.status == StreamStatus::Completed
    }

    /// Failure message, if the request failed
    pub fn error_message(&self) -> Option<&str> {
        self.status.error_message()
    }

    pub fn summary(&self) -> MetricsSummary {
        self.snapshot.summary()
    }

    /// Freeze a completed request into a history entry; failed or cancelled ones yield `None`
    pub fn into_history_entry(self) -> Option<HistoryEntry> {
        if !self.is_success() {
            return None;
        }
        Some(HistoryEntry::new(self.model, self.prompt, self.snapshot))
    }
}
