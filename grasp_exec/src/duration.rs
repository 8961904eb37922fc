//! # Duration configuration
//!
//! The time the arm is given to reach the grasp pose, and the speed factor this implies for the
//! reference approach trajectory. Updated by duration change requests at any time, read by each
//! grasp cycle when it starts.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationConfig {
    /// Time from trigger to the gripper closing on the target.
    ///
    /// Units: seconds
    pub execution_time_s: f64,

    /// Duration of the reference trajectory divided by `execution_time_s`, `None` if there is no
    /// reference duration to derive it from.
    pub speed_factor: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DurationConfig {
    /// Create a new configuration.
    ///
    /// `reference_duration_s` is the duration of the reference trajectory, if there is one.
    pub fn new(execution_time_s: f64, reference_duration_s: Option<f64>) -> Self {
        Self {
            execution_time_s,
            speed_factor: derive_speed_factor(reference_duration_s, execution_time_s),
        }
    }

    /// Replace the execution time and recompute the speed factor.
    ///
    /// Execution times which are not finite and strictly positive are rejected, leaving the
    /// configuration untouched, and `false` is returned.
    pub fn set_execution_time(
        &mut self,
        execution_time_s: f64,
        reference_duration_s: Option<f64>,
    ) -> bool {
        if !is_valid_execution_time(execution_time_s) {
            return false;
        }

        *self = Self::new(execution_time_s, reference_duration_s);

        true
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// True if the value can be used as an execution time.
pub fn is_valid_execution_time(execution_time_s: f64) -> bool {
    execution_time_s.is_finite() && execution_time_s > 0.0
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn derive_speed_factor(reference_duration_s: Option<f64>, execution_time_s: f64) -> Option<f64> {
    let factor = reference_duration_s? / execution_time_s;

    if factor.is_finite() && factor > 0.0 {
        Some(factor)
    } else {
        None
    }
}
