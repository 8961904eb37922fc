//! # Planning Service Communications Module
//!
//! Requests sent by the grasp executable to the motion planning service and the responses the
//! service sends back. Every request receives exactly one response.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::arm::{JointState, PlanTarget, PlanningGroup, Pose, Trajectory};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A request to the planning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannerRequest {
    /// Check the service is up and has loaded the given group. Answered with `Success`.
    Ping { group: PlanningGroup },

    /// Compute a Cartesian path through the given waypoints. Answered with `Trajectory`, which
    /// may be empty if no path could be found.
    CartesianPath {
        group: PlanningGroup,
        waypoints: Vec<Pose>,
        eef_step_m: f64,
        jump_threshold: f64,
    },

    /// Plan from the current state to the target. Answered with `Trajectory`.
    Plan {
        group: PlanningGroup,
        target: PlanTarget,
    },

    /// Execute a trajectory, blocking until done. Answered with `Success`.
    Execute {
        group: PlanningGroup,
        trajectory: Trajectory,
    },

    /// Plan and execute a motion to the target, blocking until done. Answered with `Success`.
    Go {
        group: PlanningGroup,
        target: PlanTarget,
    },

    /// Get the joint values of a named target from the robot description. Answered with
    /// `JointState`.
    NamedTargetValues { group: PlanningGroup, name: String },
}

/// A response from the planning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannerResponse {
    Trajectory(Trajectory),
    Success(bool),
    JointState(JointState),

    /// The service could not handle the request.
    Error(String),
}
