//! # Target pose prediction
//!
//! Extrapolates the tracked target forward to the moment the arm is expected to reach it. Only
//! the horizontal position is predicted, the grasp height and orientation come from the nominal
//! down pose since every object on the belt has the same height.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};

use comms_if::eqpt::arm::{Point, Pose};
use util::time::seconds_between;

use crate::tracker::TrackerState;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Time from `now` until the arm reaches the target, plus the age of the latest observation.
///
/// Returns `None` if there is no observation or the age cannot be represented.
///
/// Units: seconds
pub fn lookahead_s(
    state: &TrackerState,
    execution_time_s: f64,
    now: &DateTime<Utc>,
) -> Option<f64> {
    let obs = state.observation()?;

    seconds_between(&obs.timestamp, now).map(|age| execution_time_s + age)
}

/// Predict the pose the end effector must reach to grasp the target, in the robot frame.
///
/// The target position is extrapolated along the tracked velocity by the lookahead and shifted
/// into the robot frame by subtracting `robot_origin`. Height and orientation are copied from
/// `down_pose`. With no observation yet the down pose is returned unchanged.
pub fn predict_target_pose(
    state: &TrackerState,
    execution_time_s: f64,
    now: &DateTime<Utc>,
    robot_origin: &Point,
    down_pose: &Pose,
) -> Pose {
    let lookahead = lookahead_s(state, execution_time_s, now);

    let (obs, lookahead) = match (state.observation(), lookahead) {
        (Some(o), Some(l)) => (o, l),
        _ => return *down_pose,
    };

    let velocity = state.velocity();

    let mut pose = *down_pose;
    pose.position.x = obs.position.x + velocity.x * lookahead - robot_origin.x;
    pose.position.y = obs.position.y + velocity.y * lookahead - robot_origin.y;

    pose
}

/// Replace the X coordinate of `pose` with the nominal one if it is further than `tolerance_m`
/// from it.
///
/// Returns true if the pose was clamped.
pub fn clamp_x(pose: &mut Pose, nominal_x_m: f64, tolerance_m: f64) -> bool {
    let within = (pose.position.x - nominal_x_m).abs() <= tolerance_m;

    if !within {
        pose.position.x = nominal_x_m;
    }

    !within
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
