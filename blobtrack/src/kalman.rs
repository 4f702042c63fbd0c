//! Linear Kalman filter and the constant-velocity point model used by tracks

use crate::error::{Result, TrackerError};
use nalgebra::{DMatrix, DVector};

/// Matrices describing a linear-Gaussian motion and observation model
#[derive(Debug, Clone)]
pub struct KalmanFilterParams {
    pub dim_x: usize,
    pub dim_z: usize,
    /// Initial state and its covariance
    pub x: DVector<f64>,
    pub p: DMatrix<f64>,
    /// Transition, observation, observation noise and process noise
    pub f: DMatrix<f64>,
    pub h: DMatrix<f64>,
    pub r: DMatrix<f64>,
    pub q: DMatrix<f64>,
}

impl KalmanFilterParams {
    /// Constant-velocity model over `[x, y, vx, vy]` observing `[x, y]`.
    ///
    /// Process noise follows the discretised white-acceleration model: a
    /// random acceleration of variance `accel_noise` acting over `dt` gives
    /// dt^4/4 on position, dt^3/2 on the position/velocity cross term and
    /// dt^2 on velocity.
    pub fn constant_velocity(
        x: f64,
        y: f64,
        dt: f64,
        accel_noise: f64,
        position_var: f64,
        velocity_var: f64,
        measurement_var: f64,
    ) -> Self {
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        Self {
            dim_x: 4,
            dim_z: 2,
            x: DVector::from_vec(vec![x, y, 0.0, 0.0]),
            p: DMatrix::from_diagonal(&DVector::from_vec(vec![
                position_var,
                position_var,
                velocity_var,
                velocity_var,
            ])),
            f: DMatrix::from_row_slice(
                4,
                4,
                &[
                    1.0, 0.0, dt, 0.0, // x' = x + vx * dt
                    0.0, 1.0, 0.0, dt, // y' = y + vy * dt
                    0.0, 0.0, 1.0, 0.0, // vx' = vx
                    0.0, 0.0, 0.0, 1.0, // vy' = vy
                ],
            ),
            h: DMatrix::from_row_slice(2, 4, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            r: DMatrix::identity(2, 2) * measurement_var,
            q: DMatrix::from_row_slice(
                4,
                4,
                &[
                    dt4 / 4.0, 0.0, dt3 / 2.0, 0.0,
                    0.0, dt4 / 4.0, 0.0, dt3 / 2.0,
                    dt3 / 2.0, 0.0, dt2, 0.0,
                    0.0, dt3 / 2.0, 0.0, dt2,
                ],
            ) * accel_noise,
        }
    }
}

/// Linear Kalman filter with dynamically sized matrices
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    model: KalmanFilterParams,
    identity: DMatrix<f64>,
}

impl KalmanFilter {
    pub fn new(model: KalmanFilterParams) -> Self {
        let identity = DMatrix::identity(model.dim_x, model.dim_x);
        Self { model, identity }
    }

    /// Propagate the state and its uncertainty one time step
    pub fn predict(&mut self) {
        let m = &mut self.model;
        m.x = &m.f * &m.x;
        m.p = &m.f * &m.p * m.f.transpose() + &m.q;
    }

    /// Fuse observation `z` into the state
    pub fn update(&mut self, z: DVector<f64>) -> Result<()> {
        let m = &mut self.model;
        if z.len() != m.dim_z {
            return Err(TrackerError::filter(format!(
                "observation has {} components, expected {}",
                z.len(),
                m.dim_z
            )));
        }

        let innovation = z - &m.h * &m.x;
        let ht = m.h.transpose();
        let innovation_cov = &m.h * &m.p * &ht + &m.r;
        let inv = innovation_cov
            .try_inverse()
            .ok_or_else(|| TrackerError::filter("innovation covariance is singular"))?;
        let gain = &m.p * ht * inv;

        m.x += &gain * innovation;
        m.p = (&self.identity - gain * &m.h) * &m.p;
        Ok(())
    }

    pub fn get_state(&self) -> &DVector<f64> {
        &self.model.x
    }

    pub fn get_covariance(&self) -> &DMatrix<f64> {
        &self.model.p
    }
}
