//! Extractor integration tests
//!
//! Byte-level streams fed through `consume`, with time injected by a manual clock.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::{SnapshotAssertions, SseBody, chunked};
    use futures::{StreamExt, stream};
    use litellm_latency::{
        Clock, ManualClock, StreamEvent, StreamMetricsExtractor, StreamStatus,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn extractor_with(clock: &ManualClock) -> StreamMetricsExtractor {
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        StreamMetricsExtractor::new(clock)
    }

    /// One transport chunk per SSE event
    fn event_chunks(body: &str) -> Vec<Result<String, String>> {
        body.split_inclusive("\n\n").map(|s| Ok(s.to_string())).collect()
    }

    #[test]
    fn test_any_chunking_yields_same_result() {
        let body = SseBody::new()
            .role()
            .delta("Grüße ")
            .delta("aus 🌍")
            .usage(7, 4)
            .done()
            .build();

        for size in [1, 2, 3, 5, 7, 16, body.len()] {
            let clock = ManualClock::new();
            let mut extractor = extractor_with(&clock);
            let mut deltas = Vec::new();

            let status = tokio_test::block_on(extractor.consume(
                stream::iter(chunked(&body, size)),
                |event| {
                    if let StreamEvent::TextDelta { content } = event {
                        deltas.push(content.clone());
                    }
                },
            ));

            assert_eq!(status, StreamStatus::Completed, "chunk size {size}");
            assert_eq!(deltas, vec!["Grüße ", "aus 🌍"], "chunk size {size}");
            assert_eq!(extractor.accumulated_text(), "Grüße aus 🌍");
            extractor.snapshot().assert_usage(7, 4);
        }
    }

    #[test]
    fn test_timeline_follows_clock() {
        let clock = ManualClock::new();
        let mut extractor = extractor_with(&clock);
        let body = SseBody::new()
            .role()
            .delta("Hel")
            .delta("lo")
            .usage(4, 2)
            .done()
            .build();

        let ticking = clock.clone();
        let source = stream::iter(event_chunks(&body)).map(move |chunk| {
            ticking.advance_ms(100);
            chunk
        });
        let status = tokio_test::block_on(extractor.consume(source, |_| {}));

        assert_eq!(status, StreamStatus::Completed);
        let snapshot = extractor.snapshot();
        snapshot.assert_timeline();
        assert_eq!(snapshot.ttft(), Some(Duration::from_millis(200)));
        assert_eq!(snapshot.total_time(), Some(Duration::from_millis(500)));
        assert_eq!(snapshot.generation_time(), Some(Duration::from_millis(300)));
        assert_eq!(
            snapshot.last_token_at().map(|t| t - snapshot.started_at()),
            Some(Duration::from_millis(300))
        );
        assert_approx_eq!(snapshot.tokens_per_second().unwrap(), 2.0 / 0.3);

        let summary = snapshot.summary();
        assert_eq!(summary.ttft_ms, Some(200));
        assert_eq!(summary.total_time_ms, Some(500));
        assert_eq!(summary.total_tokens, Some(6));
    }

    #[test]
    fn test_events_after_done_are_ignored() {
        let clock = ManualClock::new();
        let mut extractor = extractor_with(&clock);
        let body = SseBody::new()
            .delta("kept")
            .done()
            .delta("dropped")
            .usage(1, 1)
            .build();

        let mut seen = Vec::new();
        tokio_test::block_on(extractor.consume(stream::iter(chunked(&body, 4)), |event| {
            seen.push(event.clone())
        }));

        assert_eq!(
            seen,
            vec![
                StreamEvent::TextDelta {
                    content: "kept".to_string()
                },
                StreamEvent::Done
            ]
        );
        assert_eq!(extractor.snapshot().prompt_tokens(), None);
    }

    #[test]
    fn test_crlf_stream_with_noise() {
        let clock = ManualClock::new();
        let mut extractor = extractor_with(&clock);
        let body = SseBody::new()
            .crlf()
            .raw(": ping")
            .delta("a")
            .raw("data: {truncated")
            .delta("b")
            .done()
            .build();

        let status = tokio_test::block_on(
            extractor.consume(stream::iter(chunked(&body, 3)), |_| {}),
        );

        assert_eq!(status, StreamStatus::Completed);
        assert_eq!(extractor.accumulated_text(), "ab");
        assert_eq!(extractor.unparseable_lines(), 1);
    }

    #[test]
    fn test_source_exhausted_without_terminator() {
        let clock = ManualClock::new();
        let mut extractor = extractor_with(&clock);
        // Final event has no trailing newline at all
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}";

        let status =
            tokio_test::block_on(extractor.consume(stream::iter(chunked(body, 10)), |_| {}));

        assert_eq!(status, StreamStatus::Completed);
        assert_eq!(extractor.accumulated_text(), "xy");
        assert!(extractor.snapshot().ended_at().is_some());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_freezes_snapshot() {
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        let mut extractor = extractor_with(&clock).with_cancellation(token.clone());
        let body = SseBody::new()
            .delta("one ")
            .delta("two ")
            .delta("three")
            .done()
            .build();

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let source = stream::iter(event_chunks(&body)).map(move |chunk| {
            if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                token.cancel();
            }
            chunk
        });

        let status = extractor.consume(source, |_| {}).await;

        assert_eq!(status, StreamStatus::Cancelled);
        assert_eq!(extractor.accumulated_text(), "one two ");
        assert!(extractor.snapshot().first_token_at().is_some());
        assert!(extractor.snapshot().ended_at().is_none());
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_read_error_mid_stream() {
        let clock = ManualClock::new();
        let mut extractor = extractor_with(&clock);
        let chunks: Vec<Result<String, String>> = vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n".to_string()),
            Err("connection reset; fallback to: gpt-35-turbo".to_string()),
            Ok("data: [DONE]\n\n".to_string()),
        ];

        let status = extractor.consume(stream::iter(chunks), |_| {}).await;

        assert!(matches!(status, StreamStatus::Failed { .. }));
        assert_eq!(extractor.accumulated_text(), "par");
        assert_eq!(extractor.snapshot().fallback_target(), Some("gpt-35-turbo"));
        assert!(extractor.snapshot().ended_at().is_some());
    }
}
