//! Latency metrics for streamed chat completions
//!
//! A [`MetricsSnapshot`] is created per request, mutated only by the stream extractor, and frozen
//! into a [`HistoryEntry`] once the request completes.

pub mod clock;
mod history;
mod snapshot;
mod stats;


pub use clock::{Clock, ManualClock, SystemClock};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryEntry, RequestHistory};
pub use snapshot::{MetricsSnapshot, MetricsSummary, StreamStatus};
pub use stats::{Aggregate, HistoryStats, LatencyStats};
