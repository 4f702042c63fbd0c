//! Error types for the tracking engine

use thiserror::Error;

/// Result type alias for the tracking engine
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur while configuring or running the tracker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid frame size {width}x{height}: the diagonal must be positive")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("Invalid assignment cost {value} at ({row}, {col}): costs must be finite and non-negative")]
    InvalidCost { row: usize, col: usize, value: f64 },

    #[error("Detection {index} has a non-finite centroid ({x}, {y})")]
    InvalidDetection { index: usize, x: f64, y: f64 },

    #[error("Kalman filter failure: {0}")]
    FilterError(String),
}

impl TrackerError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn filter<S: Into<String>>(msg: S) -> Self {
        Self::FilterError(msg.into())
    }
}
