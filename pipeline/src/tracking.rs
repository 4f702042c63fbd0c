//! Frame-driven tracking session: validates source input, runs the tracker and logs its output

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::track_log::TrackLog;
use crate::types::{pixel, FrameDetections};
use blobtrack::{BlobTracker, Detection, FrameSize, Rect, TrackSnapshot, TrackingOutput};
use std::path::Path;

/// Outcome of one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_number: u64,
    /// Confirmed, non-suppressed tracks
    pub outputs: Vec<TrackingOutput>,
    /// Boxes rejected as malformed before tracking
    pub dropped: usize,
}

pub struct TrackingSession {
    tracker: BlobTracker,
    log: TrackLog,
    frames_processed: u64,
}

impl TrackingSession {
    pub fn new(config: PipelineConfig, frame_size: FrameSize) -> Result<Self> {
        let tracker = BlobTracker::new(config.tracker, frame_size)?;
        let mut log = TrackLog::new(config.compress_log);
        log.set_dimensions(frame_size.width, frame_size.height);

        log::info!(
            "Tracking session started at {}x{}",
            frame_size.width,
            frame_size.height
        );
        Ok(Self {
            tracker,
            log,
            frames_processed: 0,
        })
    }

    pub fn register_suppression_region(&mut self, region: Rect) {
        self.tracker.register_suppression_region(region);
    }

    pub fn tracker(&self) -> &BlobTracker {
        &self.tracker
    }

    pub fn tracks(&self) -> Vec<TrackSnapshot> {
        self.tracker.tracks()
    }

    pub fn track_log(&self) -> &TrackLog {
        &self.log
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Run one frame through the tracker and log every reported track
    pub fn process(&mut self, frame: &FrameDetections) -> Result<FrameReport> {
        let size = FrameSize::new(frame.width, frame.height);
        let previous = self.tracker.frame_size();
        let resized = size != previous;
        if resized {
            self.tracker.set_frame_size(size)?;
        }

        let mut raw: Vec<Detection> = Vec::with_capacity(frame.boxes.len());
        let mut dropped = 0;
        for (i, b) in frame.boxes.iter().enumerate() {
            match b.defect() {
                Some(reason) => {
                    log::warn!(
                        "Frame {}: dropping box {} ({}): {:?}",
                        frame.frame_number,
                        i,
                        reason,
                        b
                    );
                    dropped += 1;
                }
                None => raw.push(b.to_detection()),
            }
        }

        let outputs = match self.tracker.update(&raw) {
            Ok(outputs) => outputs,
            Err(e) => {
                // The tracker rolled the frame back; the resolution goes with it
                if resized {
                    self.tracker.set_frame_size(previous)?;
                }
                return Err(e.into());
            }
        };

        if resized {
            self.log.set_dimensions(size.width, size.height);
            log::info!(
                "Frame {}: resolution changed to {}x{}",
                frame.frame_number,
                size.width,
                size.height
            );
        }
        for output in &outputs {
            let (x, y) = pixel(output.location);
            self.log.add_track(output.id, x, y, frame.frame_number);
        }
        self.frames_processed += 1;

        log::debug!(
            "Frame {}: {} boxes, {} dropped, {} tracks reported",
            frame.frame_number,
            frame.boxes.len(),
            dropped,
            outputs.len()
        );

        Ok(FrameReport {
            frame_number: frame.frame_number,
            outputs,
            dropped,
        })
    }

    pub fn write_log<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.log.write_to(path)
    }
}
