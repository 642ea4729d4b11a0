//! Streaming response handling for chat completions
//!
//! This module turns a Server-Sent Events response body from an OpenAI-compatible gateway
//! into text deltas, timing milestones and token usage.

mod decoder;
mod extractor;
mod parser;
mod types;
pub mod utils;


pub use decoder::Utf8ChunkDecoder;
pub use extractor::{DEFAULT_ERROR_MESSAGE, FirstTokenConvention, StreamMetricsExtractor};
pub use parser::{SseLineParser, events_from_chunk, parse_line};
pub use types::{
    ChatCompletionChoice, ChatCompletionChunk, ChatCompletionChunkChoice, ChatCompletionDelta,
    ChatCompletionMessage, ChatCompletionResponse, ErrorDetail, ErrorEnvelope,
    FALLBACK_MODEL_HEADER, StreamEvent, UsageCounts,
};
pub use utils::{extract_fallback_from_error, is_done_line, parse_sse_line, short_model_name};
