//! Gateway client module
//!
//! This module provides the HTTP client that sends chat prompts to the gateway and drives
//! the stream extractor over each response.

mod client;
mod completions;


// Re-export the main client
pub use client::LatencyClient;
