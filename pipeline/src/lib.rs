//! Tracking pipeline on top of `blobtrack`
//!
//! Accepts per-frame blob boxes from a detection source, drops malformed
//! input, drives a [`blobtrack::BlobTracker`] and keeps a JSON log of every
//! reported track position.

pub mod config;
pub mod error;
pub mod track_log;
pub mod tracking;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use track_log::TrackLog;
pub use tracking::{FrameReport, TrackingSession};
pub use types::{FrameDetections, RawBox};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
