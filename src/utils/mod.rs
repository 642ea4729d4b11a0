//! Utility modules

pub mod logging;

pub use logging::{ENV_LOG_LEVEL, init_logging, log_filter};
