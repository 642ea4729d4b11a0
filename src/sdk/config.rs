//! Client configuration

use crate::core::metrics::DEFAULT_HISTORY_CAPACITY;
use crate::core::streaming::{FirstTokenConvention, short_model_name};
use crate::sdk::errors::{Result, SDKError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default gateway address
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Environment variable overriding the gateway address
pub const ENV_BASE_URL: &str = "LITELLM_BASE_URL";
/// Environment variable carrying the gateway API key
pub const ENV_API_KEY: &str = "LITELLM_API_KEY";
/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "LITELLM_TIMEOUT_SECS";

/// Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway connection settings
    pub gateway: GatewaySettings,
    /// Number of completed requests kept in history
    pub history_capacity: usize,
    /// Whether requests stream by default
    pub stream: bool,
    /// First-token convention for non-streaming responses
    pub non_streaming_first_token: FirstTokenConvention,
    /// Provider/model catalog offered for selection
    pub catalog: ModelCatalog,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway: GatewaySettings::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stream: true,
            non_streaming_first_token: FirstTokenConvention::default(),
            catalog: ModelCatalog::default(),
        }
    }
}

/// Settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Base URL; requests go to `{base_url}/chat/completions`
    pub base_url: String,
    /// Bearer token
    pub api_key: Option<String>,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl GatewaySettings {
    /// Chat completions endpoint
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOption {
    /// Display name
    pub name: String,
    /// Model identifier sent to the gateway
    pub value: String,
}

impl ModelOption {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Models offered by one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderModels {
    /// Provider display name
    pub provider: String,
    /// Models in display order
    pub models: Vec<ModelOption>,
}

/// Static provider/model catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    providers: Vec<ProviderModels>,
}

impl ModelCatalog {
    pub fn new(providers: Vec<ProviderModels>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[ProviderModels] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.iter().all(|p| p.models.is_empty())
    }

    /// Models of a provider, matched case-insensitively
    pub fn models_for(&self, provider: &str) -> Result<&[ModelOption]> {
        self.providers
            .iter()
            .find(|p| p.provider.eq_ignore_ascii_case(provider))
            .map(|p| p.models.as_slice())
            .ok_or_else(|| SDKError::ModelNotFound(format!("unknown provider '{}'", provider)))
    }

    /// First model of a provider, the default selection when switching providers
    pub fn default_for_provider(&self, provider: &str) -> Result<&ModelOption> {
        self.models_for(provider)?
            .first()
            .ok_or_else(|| SDKError::ModelNotFound(format!("no models configured for '{}'", provider)))
    }

    /// Look a model up by its value
    pub fn find(&self, value: &str) -> Option<(&ProviderModels, &ModelOption)> {
        self.providers.iter().find_map(|provider| {
            provider
                .models
                .iter()
                .find(|model| model.value == value)
                .map(|model| (provider, model))
        })
    }

    /// Chart label for a model: its catalog name, else the last path segment of the value
    pub fn short_name<'a>(&'a self, value: &'a str) -> &'a str {
        match self.find(value) {
            Some((_, model)) => model.name.as_str(),
            None => short_model_name(value),
        }
    }

    /// Every model value in catalog order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.providers
            .iter()
            .flat_map(|p| p.models.iter().map(|m| m.value.as_str()))
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        let provider = |name: &str, models: &[(&str, &str)]| ProviderModels {
            provider: name.to_string(),
            models: models
                .iter()
                .map(|(name, value)| ModelOption::new(name, value))
                .collect(),
        };

        Self::new(vec![
            provider(
                "OpenAI",
                &[
                    ("GPT-4o", "openai/gpt-4o"),
                    ("GPT-4.1", "openai/gpt-4.1"),
                    ("GPT-4o mini", "openai/gpt-4o-mini"),
                    ("o3", "openai/o3"),
                    ("o3-mini", "openai/o3-mini"),
                ],
            ),
            provider(
                "Gemini",
                &[
                    ("Gemini 1.5 Pro", "gemini/gemini-1.5-pro"),
                    ("Gemini 1.5 Flash", "gemini/gemini-1.5-flash"),
                    ("Gemini 2.0 Flash", "gemini/gemini-2.0-flash"),
                    ("Gemini 2.5 Pro", "gemini/gemini-2.5-pro-preview-05-06"),
                ],
            ),
            provider(
                "Anthropic",
                &[
                    ("Claude 3 Opus", "anthropic/claude-3-opus-20240229"),
                    ("Claude 3 Sonnet", "anthropic/claude-3-sonnet-20240229"),
                    ("Claude 3 Haiku", "anthropic/claude-3-haiku-20240307"),
                ],
            ),
            provider(
                "Azure",
                &[("GPT-35 Turbo", "gpt-35-turbo"), ("GPT-4o", "gpt-4o")],
            ),
        ])
    }
}

/// Configuration
pub struct ConfigBuilder {
    config: ClientConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.config.gateway.base_url = base_url.to_string();
        self
    }

    pub fn api_key(mut self, api_key: &str) -> Self {
        self.config.gateway.api_key = Some(api_key.to_string());
        self
    }

    /// Settings
    pub fn timeout(mut self, timeout_secs: u64) -> Self {
        self.config.gateway.timeout_secs = timeout_secs;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.config.stream = stream;
        self
    }

    pub fn first_token_convention(mut self, convention: FirstTokenConvention) -> Self {
        self.config.non_streaming_first_token = convention;
        self
    }

    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.config.catalog = catalog;
        self
    }

    /// Configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration
impl ClientConfig {
    /// Defaults layered with environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Configuration
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SDKError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            SDKError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// File (if given) or defaults, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let mut config = Self::from_file(path)?;
                config.apply_env_overrides()?;
                config
            }
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `LITELLM_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            self.gateway.base_url = base_url;
        }
        if let Ok(api_key) = std::env::var(ENV_API_KEY) {
            self.gateway.api_key = Some(api_key);
        }
        if let Ok(timeout) = std::env::var(ENV_TIMEOUT_SECS) {
            self.gateway.timeout_secs = timeout.parse().map_err(|_| {
                SDKError::ConfigError(format!("{} must be an integer, got '{}'", ENV_TIMEOUT_SECS, timeout))
            })?;
        }
        Ok(())
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.gateway.base_url).map_err(|e| {
            SDKError::ConfigError(format!(
                "Invalid gateway base_url '{}': {}",
                self.gateway.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SDKError::ConfigError(format!(
                "Gateway base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.gateway.timeout_secs == 0 {
            return Err(SDKError::ConfigError(
                "timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(SDKError::ConfigError(
                "history_capacity must be at least 1".to_string(),
            ));
        }

        for provider in self.catalog.providers() {
            if provider.models.iter().any(|model| model.value.trim().is_empty()) {
                return Err(SDKError::ConfigError(format!(
                    "Provider '{}' has a model with an empty value",
                    provider.provider
                )));
            }
        }

        Ok(())
    }
}
