//! Test fixtures
//!
//! Builders for gateway response bodies and a thin wrapper around a `wiremock` server.

use bytes::Bytes;
use litellm_latency::{ConfigBuilder, LatencyClient};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builder for an SSE response body in the gateway's chunk format
#[derive(Debug, Clone)]
pub struct SseBody {
    lines: Vec<String>,
    line_ending: &'static str,
}

impl Default for SseBody {
    fn default() -> Self {
        Self::new()
    }
}

impl SseBody {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            line_ending: "\n",
        }
    }

    /// Terminate lines with `\r\n` instead of `\n`
    pub fn crlf(mut self) -> Self {
        self.line_ending = "\r\n";
        self
    }

    /// Raw `data:` payload
    pub fn data(mut self, payload: Value) -> Self {
        self.lines.push(format!("data: {}", payload));
        self
    }

    /// Arbitrary line, e.g. a comment or a broken payload
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn role(self) -> Self {
        self.data(json!({"choices": [{"delta": {"role": "assistant"}}]}))
    }

    pub fn delta(self, content: &str) -> Self {
        self.data(json!({"choices": [{"delta": {"content": content}}]}))
    }

    /// Delta tagged with the model that served it
    pub fn model_delta(self, model: &str, content: &str) -> Self {
        self.data(json!({"model": model, "choices": [{"delta": {"content": content}}]}))
    }

    /// Chunk announcing that the gateway fell back to another deployment
    pub fn fallback(self, model_id: &str) -> Self {
        self.data(json!({
            "choices": [{"delta": {}}],
            "headers": {"x-litellm-model-id": model_id}
        }))
    }

    pub fn usage(self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.data(json!({
            "choices": [],
            "usage": {"prompt_tokens": prompt_tokens, "completion_tokens": completion_tokens}
        }))
    }

    pub fn done(mut self) -> Self {
        self.lines.push("data: [DONE]".to_string());
        self
    }

    /// Body with a blank line after every event
    pub fn build(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{line}{end}{end}", end = self.line_ending))
            .collect()
    }
}

/// Split `body` into transport chunks of at most `size` bytes, ignoring UTF-8 boundaries
pub fn chunked(body: &str, size: usize) -> Vec<Result<Bytes, String>> {
    body.as_bytes()
        .chunks(size.max(1))
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect()
}

/// Mock LiteLLM gateway
pub struct MockGateway {
    pub server: MockServer,
}

impl MockGateway {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Answer every completion request with an SSE body
    pub async fn stream(&self, body: String) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&self.server)
            .await;
    }

    /// Answer every completion request with a JSON body and status
    pub async fn json(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new().base_url(&self.server.uri()).timeout(5)
    }

    pub fn client(&self) -> LatencyClient {
        LatencyClient::new(self.config().build()).expect("valid test config")
    }
}
