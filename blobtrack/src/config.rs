/// Configuration for the blob tracker
///
/// All distance thresholds are fractions of the frame diagonal so the same
/// configuration works at any resolution.
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track must have lived before it is reported
    pub lifetime_threshold: u32,
    /// Maximum normalised distance between a prediction and its assigned detection
    pub distance_threshold: f64,
    /// Consecutive missed frames tolerated before a track is destroyed
    pub missed_frames_threshold: u32,
    /// Time step of the motion model
    pub dt: f64,
    /// Variance of the random acceleration driving the process noise
    pub magnitude_of_acceleration_noise: f64,
    /// Number of predicted positions kept per track
    pub max_trajectory_size: usize,
    /// Normalised corner distance under which raw blobs are merged
    pub merge_threshold: f64,
    /// Normalised distance within which an older track can suppress a younger one
    pub distance_suppression_threshold: f64,
    /// A suppressor must be older than this multiple of the suppressed track's lifetime
    pub age_suppression_threshold: f64,
    /// Tracks older than this are never suppressed; `None` disables the exemption
    pub lifetime_suppression_threshold: Option<u32>,
    /// Do not count a miss while the prediction still sits inside a detection box
    pub keep_alive: bool,
    /// Hide young duplicate tracks that share a blob with an older track
    pub suppression: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            lifetime_threshold: 20,
            distance_threshold: 0.1,
            missed_frames_threshold: 10,
            dt: 0.2,
            magnitude_of_acceleration_noise: 0.5,
            max_trajectory_size: 20,
            merge_threshold: 0.05,
            distance_suppression_threshold: 0.1,
            age_suppression_threshold: 2.0,
            lifetime_suppression_threshold: None,
            keep_alive: true,
            suppression: true,
        }
    }
}

impl TrackerConfig {
    /// Reject values that would make the tracker degenerate
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TrackerError::config(format!(
                    "{name} must be a positive finite number, got {value}"
                )))
            }
        }

        positive("distance_threshold", self.distance_threshold)?;
        positive("dt", self.dt)?;
        positive("merge_threshold", self.merge_threshold)?;
        positive(
            "distance_suppression_threshold",
            self.distance_suppression_threshold,
        )?;
        positive("age_suppression_threshold", self.age_suppression_threshold)?;

        let noise = self.magnitude_of_acceleration_noise;
        if !noise.is_finite() || noise < 0.0 {
            return Err(TrackerError::config(format!(
                "magnitude_of_acceleration_noise must be finite and non-negative, got {noise}"
            )));
        }
        if self.max_trajectory_size == 0 {
            return Err(TrackerError::config(
                "max_trajectory_size must be at least 1",
            ));
        }
        Ok(())
    }
}
