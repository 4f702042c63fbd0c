//! Per-frame entry point: region filtering, blob clustering and track management

use crate::cluster::BlobClusterer;
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::geometry::{Detection, FrameSize, Rect};
use crate::manager::TrackManager;
use crate::track::{TrackSnapshot, TrackingOutput};

/// Raw detections in, confirmed tracks out.
///
/// ```rust
/// use blobtrack::{BlobTracker, Detection, FrameSize, Rect, TrackerConfig};
///
/// let mut tracker = BlobTracker::new(TrackerConfig::default(), FrameSize::new(640, 480))?;
/// let raw = [Detection::from_rect(Rect::new(100.0, 100.0, 40.0, 80.0))];
/// let outputs = tracker.update(&raw)?;
/// assert!(outputs.is_empty()); // a new track is pending until it has lived long enough
/// # Ok::<(), blobtrack::TrackerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BlobTracker {
    clusterer: BlobClusterer,
    manager: TrackManager,
    suppression_regions: Vec<Rect>,
}

impl BlobTracker {
    pub fn new(config: TrackerConfig, frame_size: FrameSize) -> Result<Self> {
        let clusterer = BlobClusterer::new(config.merge_threshold);
        let manager = TrackManager::new(config, frame_size)?;
        Ok(Self {
            clusterer,
            manager,
            suppression_regions: Vec::new(),
        })
    }

    /// Discard every future detection whose centroid falls inside `region`
    pub fn register_suppression_region(&mut self, region: Rect) {
        log::info!("Registered suppression region {}", region);
        self.suppression_regions.push(region);
    }

    pub fn suppression_regions(&self) -> &[Rect] {
        &self.suppression_regions
    }

    pub fn clear_suppression_regions(&mut self) {
        self.suppression_regions.clear();
    }

    pub fn set_frame_size(&mut self, frame_size: FrameSize) -> Result<()> {
        self.manager.set_frame_size(frame_size)
    }

    pub fn frame_size(&self) -> FrameSize {
        self.manager.frame_size()
    }

    pub fn manager(&self) -> &TrackManager {
        &self.manager
    }

    pub fn tracks(&self) -> Vec<TrackSnapshot> {
        self.manager.tracks()
    }

    /// Process the raw blobs of one frame
    pub fn update(&mut self, raw: &[Detection]) -> Result<Vec<TrackingOutput>> {
        let kept: Vec<Detection> = raw
            .iter()
            .filter(|d| {
                !self
                    .suppression_regions
                    .iter()
                    .any(|region| region.contains(&d.centroid))
            })
            .copied()
            .collect();

        if kept.len() < raw.len() {
            log::debug!(
                "Suppression regions removed {} of {} detections",
                raw.len() - kept.len(),
                raw.len()
            );
        }

        let canonical = self.clusterer.cluster(&kept, self.manager.diagonal());
        self.manager.update(&canonical)
    }
}
