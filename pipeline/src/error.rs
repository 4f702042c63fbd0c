//! Error types for the tracking pipeline

use blobtrack::TrackerError;
use thiserror::Error;

/// Result type alias for the tracking pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while loading configuration, tracking or writing logs
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Tracking failed: {0}")]
    TrackingError(#[from] TrackerError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }
}
