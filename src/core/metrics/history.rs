//! Bounded history of completed requests

use super::snapshot::{MetricsSnapshot, MetricsSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of entries kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Frozen record of one completed request
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    id: Uuid,
    recorded_at: DateTime<Utc>,
    model: String,
    prompt: String,
    accumulated_text: String,
    metrics: MetricsSummary,
    #[serde(skip)]
    snapshot: MetricsSnapshot,
}

impl HistoryEntry {
    /// Freeze a terminal snapshot together with the request that produced it
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, snapshot: MetricsSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            model: model.into(),
            prompt: prompt.into(),
            accumulated_text: snapshot.accumulated_text().to_string(),
            metrics: snapshot.summary(),
            snapshot,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn accumulated_text(&self) -> &str {
        &self.accumulated_text
    }

    pub fn metrics(&self) -> &MetricsSummary {
        &self.metrics
    }

    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.snapshot
    }
}

/// FIFO of the most recent entries; the oldest is evicted once full
#[derive(Debug, Clone)]
pub struct RequestHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RequestHistory {
    /// Create a history holding at most `capacity` entries (minimum one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted one if the history was full
    pub fn record(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most recently recorded entry
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
