//! Error handling
//!
//! Transport and gateway failures are not errors here: they end a request with
//! [`StreamStatus::Failed`](crate::core::metrics::StreamStatus) so partial metrics survive.

use thiserror::Error;

/// Error
#[derive(Error, Debug)]
pub enum SDKError {
    /// Configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not present in the catalog
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

/// SDK result type
pub type Result<T> = std::result::Result<T, SDKError>;
