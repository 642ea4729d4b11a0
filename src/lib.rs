//! # litellm-latency
//!
//! Latency measurement for chat completions served by an OpenAI-compatible LiteLLM gateway.
//!
//! ## Features
//!
//! - **Stream Metrics**: time to first token, total time and tokens per second from SSE responses
//! - **Fallback Detection**: reports when the gateway served a different model than requested
//! - **Non-Streaming Mode**: the same metrics for single JSON responses
//! - **Request History**: bounded record of recent successful requests with per-model statistics
//! - **Cancellation**: abort an in-flight request without corrupting its metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use litellm_latency::{ChatRequest, ConfigBuilder, LatencyClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new()
//!         .base_url("http://localhost:4000")
//!         .api_key("sk-1234")
//!         .build();
//!     let client = LatencyClient::new(config)?;
//!
//!     let outcome = client
//!         .send(ChatRequest::new("openai/gpt-4o", "Say hello", true))
//!         .await?;
//!
//!     println!("{}", outcome.text());
//!     println!("TTFT: {:?}", outcome.snapshot.ttft());
//!     Ok(())
//! }
//! ```
//!
//! ## Feeding a stream by hand
//!
//! ```rust
//! use litellm_latency::{StreamEvent, StreamMetricsExtractor, SystemClock};
//! use std::sync::Arc;
//!
//! let mut extractor = StreamMetricsExtractor::new(Arc::new(SystemClock));
//! let events = extractor.feed(
//!     "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n",
//! );
//! assert_eq!(events.last(), Some(&StreamEvent::Done));
//! assert_eq!(extractor.accumulated_text(), "Hi");
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod core;
pub mod sdk;
pub mod utils;

// Re-export main types
pub use sdk::{
    ChatMessage, ChatRequest, ClientConfig, ConfigBuilder, LatencyClient, RequestOutcome, Result,
    Role, SDKError,
};

// Export streaming types
pub use core::streaming::{
    ChatCompletionChunk, FirstTokenConvention, StreamEvent, StreamMetricsExtractor,
};

// Export metrics types
pub use core::metrics::{
    Clock, HistoryEntry, HistoryStats, ManualClock, MetricsSnapshot, MetricsSummary,
    RequestHistory, StreamStatus, SystemClock,
};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build timestamp (seconds since the epoch)
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
