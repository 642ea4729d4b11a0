//! Chat completion methods

use super::client::LatencyClient;
use crate::core::streaming::{
    ChatCompletionResponse, DEFAULT_ERROR_MESSAGE, ErrorEnvelope, StreamEvent,
    StreamMetricsExtractor,
};
use crate::sdk::{errors::*, types::*};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl LatencyClient {
    /// Send one prompt and measure it
    pub async fn send(&self, request: ChatRequest) -> Result<RequestOutcome> {
        self.send_with(request, CancellationToken::new(), |_| {})
            .await
    }

    /// Send one prompt, reporting each applied event and honoring `cancel`.
    ///
    /// Transport failures do not produce `Err`: they end the outcome in
    /// [`StreamStatus::Failed`](crate::core::metrics::StreamStatus::Failed) with
    /// `ended_at` recorded. `Err` is reserved for requests that could not be built.
    pub async fn send_with(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> Result<RequestOutcome> {
        validate_request(&request)?;

        let mut extractor = StreamMetricsExtractor::new(self.clock.clone())
            .with_cancellation(cancel.clone())
            .with_first_token_convention(self.config.non_streaming_first_token);

        let url = self.config.gateway.chat_completions_url();
        debug!(
            "Sending {} request for {} to {}",
            if request.stream { "streaming" } else { "non-streaming" },
            request.model,
            url
        );

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(api_key) = &self.config.gateway.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            response = builder.send() => Some(response),
        };

        match response {
            None => {
                extractor.cancel();
            }
            Some(Err(e)) => {
                extractor.fail(format!("Network error: {}", e));
            }
            Some(Ok(response)) if !response.status().is_success() => {
                let status = response.status().as_u16();
                let body = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    body = response.text() => Some(body.unwrap_or_default()),
                };
                match body {
                    Some(body) => extractor.fail(error_message_from_body(status, &body)),
                    None => extractor.cancel(),
                };
            }
            Some(Ok(response)) if request.stream => {
                extractor.consume(response.bytes_stream(), &mut on_event).await;
            }
            Some(Ok(response)) => {
                let body = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    body = response.text() => Some(body),
                };
                match body {
                    None => {
                        extractor.cancel();
                    }
                    Some(Err(e)) => {
                        extractor.fail(format!("Failed to read response body: {}", e));
                    }
                    Some(Ok(body)) => match serde_json::from_str::<ChatCompletionResponse>(&body) {
                        Ok(parsed) => {
                            for event in extractor.complete_non_streaming(&parsed) {
                                on_event(&event);
                            }
                        }
                        Err(e) => {
                            extractor.fail(format!("Invalid response body: {}", e));
                        }
                    },
                }
            }
        }

        let (snapshot, status) = extractor.into_parts();
        let ChatRequest { model, messages, .. } = request;
        let prompt = messages
            .into_iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content)
            .unwrap_or_default();

        Ok(RequestOutcome {
            model,
            prompt,
            snapshot,
            status,
        })
    }

    /// Run the same prompt against each model in turn
    pub async fn compare(
        &self,
        prompt: &str,
        models: &[String],
        stream: bool,
        cancel: CancellationToken,
    ) -> Result<Vec<RequestOutcome>> {
        let mut outcomes = Vec::with_capacity(models.len());

        for model in models {
            if cancel.is_cancelled() {
                break;
            }
            let request = ChatRequest::new(model.clone(), prompt, stream);
            let outcome = self.send_with(request, cancel.clone(), |_| {}).await?;
            info!(
                model = %model,
                success = outcome.is_success(),
                ttft_ms = outcome.summary().ttft_ms,
                total_ms = outcome.summary().total_time_ms,
                "Comparison run finished"
            );
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

fn validate_request(request: &ChatRequest) -> Result<()> {
    if request.model.trim().is_empty() {
        return Err(SDKError::InvalidRequest("model must not be empty".to_string()));
    }
    if request.prompt().trim().is_empty() {
        return Err(SDKError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Human-readable message for a non-success response
pub(crate) fn error_message_from_body(status: u16, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
        return DEFAULT_ERROR_MESSAGE.to_string();
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, body)
    }
}
