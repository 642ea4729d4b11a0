//! Aggregate latency statistics over the request history

use super::history::{HistoryEntry, RequestHistory};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean, median and range of a series of millisecond samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Aggregate {
    /// Summarize `samples`; `None` when there are none
    pub fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let len = sorted.len();
        let mean = sorted.iter().sum::<f64>() / len as f64;
        let median = if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        };

        Some(Self {
            mean,
            median,
            min: sorted[0],
            max: sorted[len - 1],
        })
    }
}

/// TTFT and total-time aggregates for one group of requests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub requests: usize,
    pub ttft: Option<Aggregate>,
    pub total_time: Option<Aggregate>,
}

impl LatencyStats {
    fn from_samples(requests: usize, ttft: &[u64], total: &[u64]) -> Self {
        Self {
            requests,
            ttft: Aggregate::from_samples(ttft),
            total_time: Aggregate::from_samples(total),
        }
    }
}

/// Overall and per-model statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub overall: LatencyStats,
    pub by_model: BTreeMap<String, LatencyStats>,
}

#[derive(Default)]
struct Samples {
    requests: usize,
    ttft: Vec<u64>,
    total: Vec<u64>,
}

impl HistoryStats {
    /// Statistics over the retained entries of `history`; `None` when it is empty
    pub fn from_history(history: &RequestHistory) -> Option<Self> {
        Self::from_entries(history.iter())
    }

    /// Compute statistics over any set of entries; `None` when there are none.
    ///
    /// Entries missing a milestone are left out of that series only.
    pub fn from_entries<'a, I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a HistoryEntry>,
    {
        let mut overall = Samples::default();
        let mut per_model: BTreeMap<String, Samples> = BTreeMap::new();

        for entry in entries {
            let metrics = entry.metrics();
            let model = per_model.entry(entry.model().to_string()).or_default();
            overall.requests += 1;
            model.requests += 1;
            if let Some(ttft) = metrics.ttft_ms {
                overall.ttft.push(ttft);
                model.ttft.push(ttft);
            }
            if let Some(total) = metrics.total_time_ms {
                overall.total.push(total);
                model.total.push(total);
            }
        }

        if overall.requests == 0 {
            return None;
        }

        Some(Self {
            overall: LatencyStats::from_samples(overall.requests, &overall.ttft, &overall.total),
            by_model: per_model
                .into_iter()
                .map(|(model, s)| (model, LatencyStats::from_samples(s.requests, &s.ttft, &s.total)))
                .collect(),
        })
    }
}
