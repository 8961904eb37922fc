//! # Motion planner
//!
//! The grasp controller never talks to the planning service directly, it goes through the
//! `MotionPlanner` trait. `PlannerClient` implements it over the message bus, tests implement it
//! in memory.
//!
//! Every method blocks until the planner answers, which for `execute` and `go` means until the
//! motion has finished.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod client;

#[cfg(test)]
pub(crate) mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::arm::{JointState, PlanTarget, PlanningGroup, Pose, Trajectory},
    net::NetError,
};

pub use client::{ConnectParams, PlannerClient};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Operations the grasp controller needs from a motion planner.
pub trait MotionPlanner {
    /// Compute a Cartesian path through `waypoints`.
    ///
    /// An empty trajectory means no path was found, which is not an error.
    fn plan_cartesian_path(
        &mut self,
        group: PlanningGroup,
        waypoints: &[Pose],
        eef_step_m: f64,
        jump_threshold: f64,
    ) -> Result<Trajectory, PlannerError>;

    /// Plan from the current state to `target` without moving.
    fn plan(&mut self, group: PlanningGroup, target: &PlanTarget)
        -> Result<Trajectory, PlannerError>;

    /// Execute a trajectory, returning whether execution succeeded.
    fn execute(
        &mut self,
        group: PlanningGroup,
        trajectory: &Trajectory,
    ) -> Result<bool, PlannerError>;

    /// Plan and execute a motion to `target`, returning whether it succeeded.
    fn go(&mut self, group: PlanningGroup, target: &PlanTarget) -> Result<bool, PlannerError>;

    /// Joint values of a named target from the robot description.
    fn named_target_values(
        &mut self,
        group: PlanningGroup,
        name: &str,
    ) -> Result<JointState, PlannerError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when using a motion planner.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Network error talking to the planner: {0}")]
    Net(NetError),

    #[error("The planner could not handle the request: {0}")]
    Remote(String),

    #[error("Unexpected response from the planner to a {0} request")]
    UnexpectedResponse(&'static str),

    #[error("The planner was unavailable after {attempts} attempts")]
    Unavailable { attempts: usize },
}
