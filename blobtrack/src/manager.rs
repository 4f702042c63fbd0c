//! Multi-object track manager: association, lifecycle and duplicate suppression

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::geometry::{Detection, FrameSize, Point};
use crate::hungarian::HungarianSolver;
use crate::track::{Track, TrackParams, TrackSnapshot, TrackingOutput};
use ndarray::Array2;

/// Owns every live track and advances them one frame at a time.
///
/// A track is *pending* until its lifetime exceeds `lifetime_threshold`,
/// *confirmed* (reported) afterwards, and removed for good once it has missed
/// more than `missed_frames_threshold` consecutive frames.
#[derive(Debug, Clone)]
pub struct TrackManager {
    config: TrackerConfig,
    frame_size: FrameSize,
    diagonal: f64,
    tracks: Vec<Track>,
    next_track_id: u32,
    n_frames: u64,
}

fn frame_diagonal(frame_size: FrameSize) -> Result<f64> {
    let diagonal = frame_size.diagonal();
    if diagonal > 0.0 {
        Ok(diagonal)
    } else {
        Err(TrackerError::InvalidFrameSize {
            width: frame_size.width,
            height: frame_size.height,
        })
    }
}

impl TrackManager {
    pub fn new(config: TrackerConfig, frame_size: FrameSize) -> Result<Self> {
        config.validate()?;
        let diagonal = frame_diagonal(frame_size)?;

        log::info!(
            "Creating TrackManager for {}x{} frames: lifetime_threshold={}, distance_threshold={:.3}, missed_frames_threshold={}, keep_alive={}, suppression={}",
            frame_size.width,
            frame_size.height,
            config.lifetime_threshold,
            config.distance_threshold,
            config.missed_frames_threshold,
            config.keep_alive,
            config.suppression
        );

        Ok(Self {
            config,
            frame_size,
            diagonal,
            tracks: Vec::new(),
            next_track_id: 1,
            n_frames: 0,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame_size
    }

    pub fn diagonal(&self) -> f64 {
        self.diagonal
    }

    /// Change the resolution used to normalise distances
    pub fn set_frame_size(&mut self, frame_size: FrameSize) -> Result<()> {
        self.diagonal = frame_diagonal(frame_size)?;
        self.frame_size = frame_size;
        Ok(())
    }

    /// Snapshots of every live track, pending ones included
    pub fn tracks(&self) -> Vec<TrackSnapshot> {
        self.tracks.iter().map(Track::snapshot).collect()
    }

    /// Trajectory segments of a live track, for renderers
    pub fn trajectory_segments(&self, track_id: u32) -> Option<Vec<(Point, Point)>> {
        self.tracks
            .iter()
            .find(|t| t.id == track_id)
            .map(Track::trajectory_segments)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of frames processed so far
    pub fn frame_count(&self) -> u64 {
        self.n_frames
    }

    /// Drop every track. Ids keep counting up so none is ever reused.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Process one frame of canonical detections.
    ///
    /// The frame is computed on a copy of the track set, so an error leaves
    /// the manager exactly as it was before the call.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackingOutput>> {
        // A track born at a non-finite point could never be matched or removed
        for (index, detection) in detections.iter().enumerate() {
            let Point { x, y } = detection.centroid;
            if !x.is_finite() || !y.is_finite() {
                return Err(TrackerError::InvalidDetection { index, x, y });
            }
        }

        let mut tracks = self.tracks.clone();
        let mut next_track_id = self.next_track_id;

        if detections.is_empty() {
            self.coast(&mut tracks);
        } else if tracks.is_empty() {
            for detection in detections {
                tracks.push(self.spawn(&mut next_track_id, detection.centroid));
            }
        } else {
            tracks = self.associate(tracks, &mut next_track_id, detections)?;
        }

        let outputs = self.report(&tracks, detections);

        self.tracks = tracks;
        self.next_track_id = next_track_id;
        self.n_frames += 1;

        log::debug!(
            "Frame {}: {} detections, {} live tracks, {} reported",
            self.n_frames,
            detections.len(),
            self.tracks.len(),
            outputs.len()
        );
        Ok(outputs)
    }

    fn spawn(&self, next_track_id: &mut u32, start: Point) -> Track {
        let id = *next_track_id;
        *next_track_id += 1;
        log::trace!("Track {} born at {}", id, start);
        Track::new(TrackParams {
            id,
            start,
            dt: self.config.dt,
            accel_noise: self.config.magnitude_of_acceleration_noise,
            max_trajectory_size: self.config.max_trajectory_size,
        })
    }

    fn is_dead(&self, track: &Track) -> bool {
        let dead = track.missed_frames() > self.config.missed_frames_threshold;
        if dead {
            log::trace!(
                "Track {} removed after {} missed frames",
                track.id,
                track.missed_frames()
            );
        }
        dead
    }

    /// Frame with no detections at all: every track misses, survivors coast on their model
    fn coast(&self, tracks: &mut Vec<Track>) {
        for track in tracks.iter_mut() {
            track.mark_missed(true);
        }
        tracks.retain(|t| !self.is_dead(t));
        for track in tracks.iter_mut() {
            track.predict();
        }
    }

    /// General case: predict, assign, update counters, remove dead, spawn new, correct
    fn associate(
        &self,
        mut tracks: Vec<Track>,
        next_track_id: &mut u32,
        detections: &[Detection],
    ) -> Result<Vec<Track>> {
        let predictions: Vec<Point> = tracks.iter_mut().map(Track::predict).collect();

        let cost = Array2::from_shape_fn((tracks.len(), detections.len()), |(i, j)| {
            predictions[i].distance(&detections[j].centroid) / self.diagonal
        });
        let assignment = HungarianSolver::solve(cost.view())?;

        // Drop matches that are too far apart to be the same object
        let mut matched = assignment.row_to_col;
        for (i, m) in matched.iter_mut().enumerate() {
            if let Some(j) = *m {
                if cost[[i, j]] > self.config.distance_threshold {
                    log::trace!(
                        "Track {} rejected detection {} at normalised distance {:.4}",
                        tracks[i].id,
                        j,
                        cost[[i, j]]
                    );
                    *m = None;
                }
            }
        }

        let mut detection_used = vec![false; detections.len()];
        for j in matched.iter().flatten() {
            detection_used[*j] = true;
        }

        for (track, m) in tracks.iter_mut().zip(&matched) {
            match m {
                Some(_) => track.mark_hit(),
                None => {
                    let prediction = track.latest_prediction();
                    let kept_alive = self.config.keep_alive
                        && detections
                            .iter()
                            .any(|d| d.bounding_box.contains(&prediction));
                    track.mark_missed(!kept_alive);
                }
            }
        }

        // Rebuild the set from the survivors rather than erasing in place
        let mut survivors: Vec<Track> = Vec::with_capacity(tracks.len() + detections.len());
        for (mut track, m) in tracks.into_iter().zip(matched) {
            if self.is_dead(&track) {
                continue;
            }
            match m {
                Some(j) => track.correct(detections[j].centroid)?,
                None => track.correct_without_measurement()?,
            };
            survivors.push(track);
        }

        for (detection, used) in detections.iter().zip(&detection_used) {
            if !used {
                survivors.push(self.spawn(next_track_id, detection.centroid));
            }
        }

        Ok(survivors)
    }

    /// Which tracks are hidden as duplicates of an older track in the same blob
    fn suppression_mask(&self, tracks: &[Track], detections: &[Detection]) -> Vec<bool> {
        if !self.config.suppression {
            return vec![false; tracks.len()];
        }

        let max_distance = self.config.distance_suppression_threshold * self.diagonal;
        tracks
            .iter()
            .map(|track| {
                if let Some(immune) = self.config.lifetime_suppression_threshold {
                    if track.lifetime() > immune {
                        return false;
                    }
                }
                let here = track.latest_prediction();
                let min_age = self.config.age_suppression_threshold * f64::from(track.lifetime());

                tracks.iter().any(|other| {
                    if other.id == track.id || other.lifetime() <= track.lifetime() {
                        return false;
                    }
                    let there = other.latest_prediction();
                    f64::from(other.lifetime()) > min_age
                        && here.distance(&there) <= max_distance
                        && detections.iter().any(|d| {
                            d.bounding_box.contains(&here) && d.bounding_box.contains(&there)
                        })
                })
            })
            .collect()
    }

    fn report(&self, tracks: &[Track], detections: &[Detection]) -> Vec<TrackingOutput> {
        let suppressed = self.suppression_mask(tracks, detections);
        tracks
            .iter()
            .zip(suppressed)
            .filter(|(track, suppressed)| {
                if *suppressed && track.lifetime() > self.config.lifetime_threshold {
                    log::trace!("Track {} suppressed", track.id);
                }
                track.lifetime() > self.config.lifetime_threshold && !*suppressed
            })
            .map(|(track, _)| track.output())
            .collect()
    }
}
