//! Type definitions for streamed and non-streamed chat completions

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Envelope header carrying the backing model the gateway fell back to
pub const FALLBACK_MODEL_HEADER: &str = "x-litellm-model-id";

/// One fact extracted from a server line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental content fragment
    TextDelta {
        /// Fragment text
        content: String,
    },
    /// Token accounting; absent counts are not yet known
    Usage {
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    /// The gateway substituted a different backing model
    FallbackNotice {
        target_model_id: String,
    },
    /// Model name reported by the gateway
    ModelReported {
        model: String,
    },
    /// Stream terminator
    Done,
    /// A data line whose payload is not a valid envelope
    Unparseable,
}

/// Streaming response chunk for chat completions.
///
/// Every field is optional; missing or malformed side facts are simply absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<ChatCompletionChunkChoice>>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage: Option<UsageCounts>,
    /// Gateway-specific headers echoed into the payload
    #[serde(default, deserialize_with = "lenient")]
    pub headers: Option<HashMap<String, serde_json::Value>>,
}

impl ChatCompletionChunk {
    /// Parse a `data:` payload.
    ///
    /// Only a JSON object whose `choices` are well formed is an envelope; side fields of the
    /// wrong shape are dropped instead of rejecting the line.
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<serde_json::Value>(payload)? {
            value @ serde_json::Value::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Content of the first choice's delta, if non-empty
    pub fn delta_content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
            .filter(|content| !content.is_empty())
    }

    /// Fallback model id from the echoed headers
    pub fn fallback_model_id(&self) -> Option<String> {
        match self.headers.as_ref()?.get(FALLBACK_MODEL_HEADER)? {
            serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Choice in a streaming chat completion chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChunkChoice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub delta: Option<ChatCompletionDelta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Delta containing incremental content in streaming response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// `usage` object of a chunk or complete response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounts {
    #[serde(default, deserialize_with = "lenient")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub completion_tokens: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_tokens: Option<u32>,
}

impl From<UsageCounts> for StreamEvent {
    fn from(usage: UsageCounts) -> Self {
        StreamEvent::Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }
    }
}

/// Complete (non-streaming) chat completion body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage: Option<UsageCounts>,
    /// Present when the gateway answered 2xx with an error payload
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

impl ChatCompletionResponse {
    /// Message content of the first choice, empty when missing
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .unwrap_or_default()
    }
}

/// Choice of a complete response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub message: Option<ChatCompletionMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message of a complete response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// `{ "error": { "message": ... } }` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

/// Error detail reported by the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// Deserialize an optional side field, treating a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
