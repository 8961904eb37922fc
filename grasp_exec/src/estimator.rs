//! # Pose estimator
//!
//! Converts the localiser's pixel space estimate of the target into a point in the world frame.
//! The camera looks straight down on the conveyor so the mapping is a scale and an offset, and
//! the target height is the constant height of objects on the belt.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Calibration of the conveyor camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimatorParams {
    /// World frame X coordinate of the image origin.
    ///
    /// Units: meters
    pub origin_x_m: f64,

    /// World frame Y coordinate of the image origin.
    ///
    /// Units: meters
    pub origin_y_m: f64,

    /// Image scale on the belt surface.
    ///
    /// Units: pixels/meter
    pub pixels_per_m: f64,

    /// World frame Z coordinate of a target sitting on the belt.
    ///
    /// Units: meters
    pub target_z_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            origin_x_m: 1.581,
            origin_y_m: -0.16,
            pixels_per_m: 154.29,
            target_z_m: 0.964,
        }
    }
}

impl EstimatorParams {
    /// Estimate the world frame position of a target seen at pixel `(u, v)`.
    ///
    /// Image axes point against the world axes, so increasing `u` decreases X and increasing `v`
    /// decreases Y. NaN pixel coordinates (nothing seen) give NaN coordinates, which the tracker
    /// discards.
    pub fn estimate(&self, pixel: [f64; 2]) -> Vector3<f64> {
        Vector3::new(
            self.origin_x_m - pixel[0] / self.pixels_per_m,
            self.origin_y_m - pixel[1] / self.pixels_per_m,
            self.target_z_m,
        )
    }
}
