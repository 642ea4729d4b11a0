//! Client integration tests against a mock gateway

#[cfg(test)]
mod tests {
    use crate::common::{MockGateway, SnapshotAssertions, SseBody};
    use crate::{assert_err, assert_ok};
    use litellm_latency::core::metrics::HistoryStats;
    use litellm_latency::{ChatRequest, LatencyClient, SDKError, StreamStatus};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_fallback_and_model_reported() {
        let gateway = MockGateway::start().await;
        gateway
            .stream(
                SseBody::new()
                    .fallback("azure/gpt-4o-eu")
                    .model_delta("gpt-4o-2024-08-06", "Bon")
                    .model_delta("gpt-4o-mini", "jour")
                    .usage(9, 3)
                    .done()
                    .build(),
            )
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("openai/gpt-4o", "Say hi in French", true))
                .await
        );

        assert!(outcome.is_success());
        assert_eq!(outcome.text(), "Bonjour");
        assert_eq!(outcome.snapshot.fallback_target(), Some("azure/gpt-4o-eu"));
        assert_eq!(outcome.snapshot.model_used(), Some("gpt-4o-2024-08-06"));
        outcome.snapshot.assert_timeline();
        outcome.snapshot.assert_usage(9, 3);
    }

    #[tokio::test]
    async fn test_stream_without_done_marker_completes() {
        let gateway = MockGateway::start().await;
        gateway
            .stream(SseBody::new().delta("partial ").delta("answer").build())
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", true))
                .await
        );

        assert_eq!(outcome.status, StreamStatus::Completed);
        assert_eq!(outcome.text(), "partial answer");
        outcome.snapshot.assert_timeline();
    }

    #[tokio::test]
    async fn test_crlf_stream() {
        let gateway = MockGateway::start().await;
        gateway
            .stream(SseBody::new().crlf().delta("ok").usage(1, 1).done().build())
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", true))
                .await
        );

        assert!(outcome.is_success());
        assert_eq!(outcome.text(), "ok");
    }

    #[tokio::test]
    async fn test_error_envelope_on_success_status() {
        let gateway = MockGateway::start().await;
        gateway
            .json(200, json!({"error": {"message": "model not mapped"}}))
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", false))
                .await
        );

        assert_eq!(outcome.error_message(), Some("model not mapped"));
        assert!(outcome.snapshot.ended_at().is_some());
        assert!(outcome.snapshot.first_token_at().is_none());
    }

    #[tokio::test]
    async fn test_error_message_mentions_fallback() {
        let gateway = MockGateway::start().await;
        gateway
            .json(
                500,
                json!({"error": {"message": "Deployment timed out. Fallback to: gpt-35-turbo, retrying"}}),
            )
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("azure/gpt-4o", "hi", true))
                .await
        );

        assert!(matches!(outcome.status, StreamStatus::Failed { .. }));
        assert_eq!(outcome.snapshot.fallback_target(), Some("gpt-35-turbo"));
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let gateway = MockGateway::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
            .mount(&gateway.server)
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", true))
                .await
        );

        assert_eq!(
            outcome.error_message(),
            Some("HTTP 502: upstream unavailable")
        );
    }

    #[tokio::test]
    async fn test_timeout_is_a_failure() {
        let gateway = MockGateway::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SseBody::new().delta("late").done().build())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&gateway.server)
            .await;

        let client = assert_ok!(LatencyClient::new(gateway.config().timeout(1).build()));
        let outcome = assert_ok!(client.send(ChatRequest::new("gpt-4o", "hi", true)).await);

        assert!(outcome.error_message().unwrap().starts_with("Network error"));
        assert_eq!(outcome.text(), "");
    }

    #[tokio::test]
    async fn test_no_api_key_sends_no_authorization() {
        let gateway = MockGateway::start().await;
        gateway.stream(SseBody::new().delta("x").done().build()).await;

        assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", true))
                .await
        );

        let requests = gateway.server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["stream"], true);
    }

    #[tokio::test]
    async fn test_history_keeps_latest_ten() {
        let gateway = MockGateway::start().await;
        gateway
            .stream(SseBody::new().delta("pong").usage(2, 1).done().build())
            .await;
        let client = gateway.client();
        let mut history = client.new_history();

        for i in 0..12 {
            let model = if i % 2 == 0 { "openai/gpt-4o" } else { "gemini/gemini-2.0-flash" };
            let outcome = assert_ok!(
                client
                    .send(ChatRequest::new(model, format!("ping {i}"), true))
                    .await
            );
            if let Some(entry) = outcome.into_history_entry() {
                history.record(entry);
            }
        }

        assert_eq!(history.len(), 10);
        let prompts: Vec<_> = history.iter().map(|e| e.prompt().to_string()).collect();
        assert_eq!(prompts.first().map(String::as_str), Some("ping 2"));
        assert_eq!(history.latest().map(|e| e.prompt()), Some("ping 11"));

        let stats = HistoryStats::from_history(&history).unwrap();
        assert_eq!(stats.overall.requests, 10);
        assert_eq!(stats.by_model["openai/gpt-4o"].requests, 5);
        assert_eq!(stats.by_model["gemini/gemini-2.0-flash"].requests, 5);
    }

    #[tokio::test]
    async fn test_failed_requests_are_not_recorded() {
        let gateway = MockGateway::start().await;
        gateway
            .json(429, json!({"error": {"message": "rate limited"}}))
            .await;

        let outcome = assert_ok!(
            gateway
                .client()
                .send(ChatRequest::new("gpt-4o", "hi", true))
                .await
        );
        assert_eq!(outcome.error_message(), Some("rate limited"));
        assert!(outcome.into_history_entry().is_none());
    }

    #[tokio::test]
    async fn test_empty_model_is_rejected() {
        let gateway = MockGateway::start().await;
        let error = assert_err!(
            gateway
                .client()
                .send(ChatRequest::new("", "hi", true))
                .await
        );
        assert!(matches!(error, SDKError::InvalidRequest(_)));
    }
}
