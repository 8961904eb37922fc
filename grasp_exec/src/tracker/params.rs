//! Parameters structure for the Tracker

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::estimator::EstimatorParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the Tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Only every `frame_skip`th camera frame updates the tracker, the frames in between are
    /// dropped. Must be at least 1.
    pub frame_skip: usize,

    /// Minimum luma value of a target pixel for the bright spot localiser.
    pub localiser_threshold: u8,

    /// Camera calibration.
    pub estimator: EstimatorParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            frame_skip: 6,
            localiser_threshold: 200,
            estimator: EstimatorParams::default(),
        }
    }
}

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_skip == 0 {
            return Err(String::from("frame_skip must be at least 1"));
        }
        if !(self.estimator.pixels_per_m.is_finite() && self.estimator.pixels_per_m != 0.0) {
            return Err(format!(
                "estimator.pixels_per_m must be finite and nonzero, found {}",
                self.estimator.pixels_per_m
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params_valid() {
        let params: Params = toml::from_str(include_str!("../../../params/tracker.toml")).unwrap();

        assert!(params.validate().is_ok());
        assert_eq!(params.frame_skip, 6);
        assert_eq!(params.estimator, EstimatorParams::default());
    }

    #[test]
    fn test_zero_frame_skip_invalid() {
        let params = Params {
            frame_skip: 0,
            ..Default::default()
        };

        assert!(params.validate().is_err());
    }
}
