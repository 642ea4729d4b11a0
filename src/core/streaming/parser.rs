//! Line-oriented SSE parsing for OpenAI-compatible chat completion streams

use super::types::{ChatCompletionChunk, StreamEvent};
use super::utils::{is_done_line, parse_sse_line};
use tracing::{debug, trace};

/// Incremental SSE line parser.
///
/// Chunks are appended to a pending buffer; only complete (newline-terminated) lines are
/// classified. A trailing partial line waits for the next chunk. After the terminator line
/// every further input is ignored, including any bytes that followed it.
#[derive(Debug, Default)]
pub struct SseLineParser {
    pending: String,
    finished: bool,
    unparseable_lines: usize,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one chunk of text and return the events of every line it completes
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let incomplete = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, incomplete);

        let mut events = Vec::new();
        for line in complete[..last_newline].split('\n') {
            if self.process_line(line, &mut events) {
                break;
            }
        }
        events
    }

    /// Flush the pending partial line once the source is exhausted
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }

        let line = std::mem::take(&mut self.pending);
        let mut events = Vec::new();
        if !line.is_empty() {
            self.process_line(&line, &mut events);
        }
        events
    }

    /// Text buffered while waiting for the rest of a line
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Whether the terminator line has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of data lines discarded as unparseable
    pub fn unparseable_lines(&self) -> usize {
        self.unparseable_lines
    }

    /// Classify a line and push its events; returns `true` on the terminator
    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) -> bool {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let parsed = parse_line(line);

        if parsed.contains(&StreamEvent::Unparseable) {
            self.unparseable_lines += 1;
        }

        if parsed.last() == Some(&StreamEvent::Done) {
            events.extend(parsed);
            self.finished = true;
            self.pending.clear();
            return true;
        }

        events.extend(parsed);
        false
    }
}

/// Classify a single complete line.
///
/// The terminator yields `Done`; a `data: ` line yields the facts its envelope carries or
/// `Unparseable`; anything else (keep-alives, comments, blank separators) yields nothing.
pub fn parse_line(line: &str) -> Vec<StreamEvent> {
    if is_done_line(line) {
        return vec![StreamEvent::Done];
    }

    let Some(payload) = parse_sse_line(line) else {
        if !line.is_empty() {
            trace!("Ignoring non-data line: {}", line);
        }
        return Vec::new();
    };

    match ChatCompletionChunk::from_payload(payload) {
        Ok(chunk) => events_from_chunk(chunk),
        Err(e) => {
            debug!("Discarding unparseable data line: {}", e);
            vec![StreamEvent::Unparseable]
        }
    }
}

/// Facts carried by one envelope, in application order
pub fn events_from_chunk(chunk: ChatCompletionChunk) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(model) = chunk.model.as_ref().filter(|model| !model.is_empty()) {
        events.push(StreamEvent::ModelReported {
            model: model.clone(),
        });
    }

    if let Some(target_model_id) = chunk.fallback_model_id() {
        events.push(StreamEvent::FallbackNotice { target_model_id });
    }

    if let Some(content) = chunk.delta_content() {
        events.push(StreamEvent::TextDelta {
            content: content.to_string(),
        });
    }

    if let Some(usage) = chunk.usage {
        events.push(usage.into());
    }

    events
}
