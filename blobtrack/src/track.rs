//! Single-object track: constant-velocity Kalman estimate plus lifecycle counters

use crate::error::Result;
use crate::geometry::{Color, Point};
use crate::kalman::{KalmanFilter, KalmanFilterParams};
use nalgebra::DVector;
use serde::Serialize;
use std::collections::VecDeque;

/// Observation noise on the measured centroid
const MEASUREMENT_VAR: f64 = 0.1;
/// Initial variance of the position estimate
const INITIAL_POSITION_VAR: f64 = 0.1;
/// Initial variance of the velocity estimate; a new track has never moved
const INITIAL_VELOCITY_VAR: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct TrackParams {
    pub id: u32,
    pub start: Point,
    pub dt: f64,
    pub accel_noise: f64,
    pub max_trajectory_size: usize,
}

/// Read-only view of a track's state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub id: u32,
    pub lifetime: u32,
    pub missed_frames: u32,
    pub position: Point,
    pub velocity: Point,
}

/// What the tracker reports for one confirmed track in one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingOutput {
    pub id: u32,
    pub location: Point,
    pub color: Color,
    /// Copy of the track's recent predicted positions, oldest first
    pub trajectory: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct Track {
    /// track id
    pub id: u32,
    pub color: Color,
    kf: KalmanFilter,
    /// number of frames the track has existed for
    lifetime: u32,
    /// number of consecutive frames without a real measurement
    missed_frames: u32,
    trajectory: VecDeque<Point>,
    max_trajectory_size: usize,
    /// latest predicted or corrected position
    prediction: Point,
    /// last real measurement, reused as a pseudo-measurement when dead reckoning
    last_observed: Point,
}

impl Track {
    /// Start a track at a detection centroid with zero velocity
    pub fn new(p: TrackParams) -> Self {
        let params = KalmanFilterParams::constant_velocity(
            p.start.x,
            p.start.y,
            p.dt,
            p.accel_noise,
            INITIAL_POSITION_VAR,
            INITIAL_VELOCITY_VAR,
            MEASUREMENT_VAR,
        );

        Track {
            id: p.id,
            color: Color::for_track(p.id),
            kf: KalmanFilter::new(params),
            lifetime: 0,
            missed_frames: 0,
            trajectory: VecDeque::with_capacity(p.max_trajectory_size),
            max_trajectory_size: p.max_trajectory_size,
            prediction: p.start,
            last_observed: p.start,
        }
    }

    /// Advance the filter one step and record the predicted position
    pub fn predict(&mut self) -> Point {
        self.kf.predict();
        let predicted = self.position();
        self.push_trajectory(predicted);
        self.prediction = predicted;
        predicted
    }

    /// Fuse an observed position into the estimate
    pub fn correct(&mut self, observed: Point) -> Result<Point> {
        self.kf
            .update(DVector::from_vec(vec![observed.x, observed.y]))?;
        self.last_observed = observed;
        self.prediction = self.position();
        Ok(self.prediction)
    }

    /// Dead reckoning: re-apply the last real observation as a pseudo-measurement
    pub fn correct_without_measurement(&mut self) -> Result<Point> {
        self.correct(self.last_observed)
    }

    /// A measurement was assigned this frame
    pub fn mark_hit(&mut self) {
        self.lifetime += 1;
        self.missed_frames = 0;
    }

    /// No measurement this frame; `penalize` is false when the track is kept alive
    pub fn mark_missed(&mut self, penalize: bool) {
        self.lifetime += 1;
        if penalize {
            self.missed_frames += 1;
        }
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    pub fn latest_prediction(&self) -> Point {
        self.prediction
    }

    /// Current filtered position
    pub fn position(&self) -> Point {
        let state = self.kf.get_state();
        Point::new(state[0], state[1])
    }

    /// Current filtered velocity in pixels per unit of `dt`
    pub fn velocity(&self) -> Point {
        let state = self.kf.get_state();
        Point::new(state[2], state[3])
    }

    pub fn trajectory(&self) -> Vec<Point> {
        self.trajectory.iter().copied().collect()
    }

    /// Consecutive trajectory points as line segments, oldest first
    pub fn trajectory_segments(&self) -> Vec<(Point, Point)> {
        self.trajectory
            .iter()
            .zip(self.trajectory.iter().skip(1))
            .map(|(a, b)| (*a, *b))
            .collect()
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            lifetime: self.lifetime,
            missed_frames: self.missed_frames,
            position: self.position(),
            velocity: self.velocity(),
        }
    }

    pub fn output(&self) -> TrackingOutput {
        TrackingOutput {
            id: self.id,
            location: self.prediction,
            color: self.color,
            trajectory: self.trajectory(),
        }
    }

    fn push_trajectory(&mut self, point: Point) {
        if self.max_trajectory_size == 0 {
            return;
        }
        while self.trajectory.len() >= self.max_trajectory_size {
            self.trajectory.pop_front();
        }
        self.trajectory.push_back(point);
    }

    #[cfg(test)]
    pub(crate) fn set_lifetime(&mut self, lifetime: u32) {
        self.lifetime = lifetime;
    }

    #[cfg(test)]
    pub(crate) fn set_prediction(&mut self, prediction: Point) {
        self.prediction = prediction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn track_at(x: f64, y: f64, max_trajectory_size: usize) -> Track {
        Track::new(TrackParams {
            id: 1,
            start: Point::new(x, y),
            dt: 0.2,
            accel_noise: 0.5,
            max_trajectory_size,
        })
    }

    #[test]
    fn test_new_track_starts_at_detection() {
        let track = track_at(40.0, 60.0, 10);
        assert_eq!(track.position(), Point::new(40.0, 60.0));
        assert_eq!(track.velocity(), Point::new(0.0, 0.0));
        assert_eq!(track.latest_prediction(), Point::new(40.0, 60.0));
        assert_eq!(track.lifetime(), 0);
        assert_eq!(track.missed_frames(), 0);
        assert!(track.trajectory().is_empty());
    }

    #[test]
    fn test_stationary_convergence() {
        let mut track = track_at(100.0, 100.0, 20);
        for _ in 0..30 {
            track.predict();
            track.correct(Point::new(100.0, 100.0)).unwrap();
            track.mark_hit();
        }
        let position = track.position();
        let velocity = track.velocity();
        assert_abs_diff_eq!(position.x, 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(position.y, 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(velocity.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(velocity.y, 0.0, epsilon = 1e-6);
        assert_eq!(track.lifetime(), 30);
    }

    #[test]
    fn test_converges_after_offset_start() {
        // Started 10px off, then observed stationary at (100, 100)
        let mut track = track_at(90.0, 110.0, 20);
        for _ in 0..30 {
            track.predict();
            track.correct(Point::new(100.0, 100.0)).unwrap();
        }
        let position = track.position();
        assert_abs_diff_eq!(position.x, 100.0, epsilon = 0.5);
        assert_abs_diff_eq!(position.y, 100.0, epsilon = 0.5);
        assert!(track.velocity().x.abs() < 2.0);
        assert!(track.velocity().y.abs() < 2.0);
    }

    #[test]
    fn test_learns_constant_velocity() {
        // 2px per frame with dt = 0.2 is 10px per time unit
        let mut track = track_at(0.0, 50.0, 20);
        for frame in 1..=120 {
            track.predict();
            track
                .correct(Point::new(2.0 * frame as f64, 50.0))
                .unwrap();
        }
        assert_abs_diff_eq!(track.velocity().x, 10.0, epsilon = 1.0);
        assert_abs_diff_eq!(track.velocity().y, 0.0, epsilon = 0.5);
        assert_abs_diff_eq!(track.position().x, 240.0, epsilon = 1.0);
    }

    #[test]
    fn test_trajectory_is_bounded_and_ordered() {
        let mut track = track_at(0.0, 0.0, 3);
        for frame in 1..=5 {
            track.predict();
            track.correct(Point::new(frame as f64, 0.0)).unwrap();
        }
        let trajectory = track.trajectory();
        assert_eq!(trajectory.len(), 3);
        assert!(trajectory.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(track.trajectory_segments().len(), 2);
    }

    #[test]
    fn test_trajectory_snapshot_is_a_copy() {
        let mut track = track_at(0.0, 0.0, 5);
        track.predict();
        let before = track.output();
        track.predict();
        assert_eq!(before.trajectory.len(), 1);
        assert_eq!(track.trajectory().len(), 2);
    }

    #[test]
    fn test_dead_reckoning_reuses_last_observation() {
        let mut track = track_at(0.0, 0.0, 10);
        track.predict();
        track.correct(Point::new(5.0, 5.0)).unwrap();
        track.predict();
        let corrected = track.correct_without_measurement().unwrap();
        let mut reference = track_at(0.0, 0.0, 10);
        reference.predict();
        reference.correct(Point::new(5.0, 5.0)).unwrap();
        reference.predict();
        let expected = reference.correct(Point::new(5.0, 5.0)).unwrap();
        assert_eq!(corrected, expected);
        assert_eq!(track.latest_prediction(), corrected);
    }

    #[test]
    fn test_counters() {
        let mut track = track_at(0.0, 0.0, 10);
        track.mark_missed(true);
        track.mark_missed(true);
        assert_eq!(track.missed_frames(), 2);
        track.mark_missed(false);
        assert_eq!(track.missed_frames(), 2);
        track.mark_hit();
        assert_eq!(track.missed_frames(), 0);
        assert_eq!(track.lifetime(), 4);
    }
}
