//! Gateway SDK
//!
//! Configuration, request types and the measuring client for an
//! OpenAI-compatible LiteLLM gateway.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-exports for convenience
pub use client::LatencyClient;
pub use config::{ClientConfig, ConfigBuilder, GatewaySettings, ModelCatalog, ModelOption};
pub use errors::{Result, SDKError};
pub use types::*;

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
