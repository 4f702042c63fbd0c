//! Multi-object tracking of foreground blobs
//!
//! This crate turns a noisy per-frame list of blob detections into stable,
//! identity-preserving tracks. Each frame goes through four stages:
//!
//! - suppression regions drop detections in known false-positive areas
//! - [`BlobClusterer`] merges fragments of one object into a single detection
//! - every [`Track`] predicts its position with a constant-velocity Kalman filter
//! - [`TrackManager`] assigns detections to predictions with [`HungarianSolver`],
//!   then handles birth, confirmation, duplicate suppression and death
//!
//! ```rust,ignore
//! use blobtrack::{BlobTracker, Detection, FrameSize, Rect, TrackerConfig};
//!
//! let mut tracker = BlobTracker::new(TrackerConfig::default(), FrameSize::new(640, 480))?;
//! for frame in frames {
//!     let raw: Vec<Detection> = frame.boxes.iter().map(|r| Detection::from_rect(*r)).collect();
//!     for output in tracker.update(&raw)? {
//!         println!("track {} at {}", output.id, output.location);
//!     }
//! }
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hungarian; // Hungarian algorithm for optimal assignment
pub mod kalman;
pub mod manager;
pub mod track;
pub mod tracker;

pub use cluster::BlobClusterer;
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use geometry::{Color, Detection, FrameSize, Point, Rect};
pub use hungarian::{AssignmentResult, HungarianSolver};
pub use manager::TrackManager;
pub use track::{Track, TrackSnapshot, TrackingOutput};
pub use tracker::BlobTracker;
