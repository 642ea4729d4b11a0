//! Core functionality for latency measurement
//!
//! This module contains the stream extractor and the metrics data structures it maintains.

pub mod metrics;
pub mod streaming;
