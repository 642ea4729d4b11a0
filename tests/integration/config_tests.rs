//! Configuration file integration tests

#[cfg(test)]
mod tests {
    use crate::{assert_err, assert_ok};
    use litellm_latency::sdk::config::{ENV_API_KEY, ENV_BASE_URL, ENV_TIMEOUT_SECS};
    use litellm_latency::{ClientConfig, FirstTokenConvention, SDKError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(yaml.as_bytes()).expect("write config");
        file
    }

    fn env_overrides_present() -> bool {
        [ENV_BASE_URL, ENV_API_KEY, ENV_TIMEOUT_SECS]
            .iter()
            .any(|var| std::env::var(var).is_ok())
    }

    #[test]
    fn test_full_config_file() {
        let file = write_config(
            r#"
gateway:
  base_url: "https://llm.internal.example:4000/"
  api_key: "sk-local"
  timeout_secs: 30
history_capacity: 25
stream: false
non_streaming_first_token: request_start
catalog:
  - provider: Local
    models:
      - name: Llama 3
        value: ollama/llama3
"#,
        );

        let config = assert_ok!(ClientConfig::from_file(file.path()));

        assert_eq!(
            config.gateway.chat_completions_url(),
            "https://llm.internal.example:4000/chat/completions"
        );
        assert_eq!(config.gateway.api_key.as_deref(), Some("sk-local"));
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.history_capacity, 25);
        assert!(!config.stream);
        assert_eq!(
            config.non_streaming_first_token,
            FirstTokenConvention::RequestStart
        );
        assert_eq!(config.catalog.values().collect::<Vec<_>>(), vec!["ollama/llama3"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = write_config("gateway:\n  api_key: sk-only-key\n");

        let config = assert_ok!(ClientConfig::from_file(file.path()));
        let defaults = ClientConfig::default();

        assert_eq!(config.gateway.base_url, defaults.gateway.base_url);
        assert_eq!(config.gateway.timeout_secs, 120);
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.catalog, defaults.catalog);
        assert_eq!(
            config.non_streaming_first_token,
            FirstTokenConvention::ResponseEnd
        );
    }

    #[test]
    fn test_malformed_yaml_is_a_config_error() {
        let file = write_config("gateway: [not, a, mapping");
        let error = assert_err!(ClientConfig::from_file(file.path()));
        assert!(matches!(error, SDKError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = assert_err!(ClientConfig::from_file(dir.path().join("absent.yaml")));
        assert!(matches!(error, SDKError::ConfigError(message) if message.contains("absent.yaml")));
    }

    #[test]
    fn test_load_validates() {
        if env_overrides_present() {
            return;
        }
        let file = write_config("history_capacity: 0\n");
        let error = assert_err!(ClientConfig::load(Some(file.path())));
        assert!(matches!(error, SDKError::ConfigError(message) if message.contains("history_capacity")));
    }

    #[test]
    fn test_default_config_survives_yaml() {
        let yaml = assert_ok!(serde_yaml::to_string(&ClientConfig::default()));
        let file = write_config(&yaml);
        let config = assert_ok!(ClientConfig::from_file(file.path()));
        assert_eq!(config, ClientConfig::default());
    }
}
