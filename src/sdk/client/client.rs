//! Core gateway client implementation

use crate::core::metrics::{Clock, RequestHistory, SystemClock};
use crate::sdk::{config::ClientConfig, errors::*};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Client for an OpenAI-compatible chat completions gateway that measures every request
#[derive(Debug, Clone)]
pub struct LatencyClient {
    pub(crate) config: ClientConfig,
    pub(crate) http_client: reqwest::Client,
    pub(crate) clock: Arc<dyn Clock>,
}

impl LatencyClient {
    /// Create new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        // Build HTTP client
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway.timeout_secs))
            .build()
            .map_err(|e| SDKError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "LatencyClient created for {}",
            config.gateway.chat_completions_url()
        );

        Ok(Self {
            config,
            http_client,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source used for metrics
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Empty history sized from the configuration
    pub fn new_history(&self) -> RequestHistory {
        RequestHistory::new(self.config.history_capacity)
    }
}
