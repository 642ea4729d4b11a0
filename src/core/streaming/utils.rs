//! Utility functions for streaming

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of every data line
pub const DATA_PREFIX: &str = "data: ";

/// Literal stream terminator line
pub const DONE_LINE: &str = "data: [DONE]";

/// `fallback to: <id>` mention in gateway error text
pub static FALLBACK_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fallback to: ([^,\s]+)").unwrap_or_else(|e| {
        tracing::error!("Failed to compile fallback mention regex: {}", e);
        Regex::new(r"[^\s\S]").unwrap()
    })
});

/// Parse SSE data line
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Check if SSE line indicates end of stream
pub fn is_done_line(line: &str) -> bool {
    line == DONE_LINE
}

/// Model id named by a "fallback to: <id>" mention in an error message
pub fn extract_fallback_from_error(message: &str) -> Option<String> {
    FALLBACK_MENTION
        .captures(message)?
        .get(1)
        .map(|id| id.as_str().to_string())
}

/// Last path segment of a model value, e.g. `openai/gpt-4o` -> `gpt-4o`
pub fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}
