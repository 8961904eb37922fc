//! # Grasp control module
//!
//! Runs the grasp cycle when a trigger arrives: predict where the target will be, approach it,
//! close the gripper, return home and release. Every motion happens inside an execution session
//! so that only one cycle, or the watchdog, moves the arm at a time.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod targets;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::planner::PlannerError;
use comms_if::{eqpt::arm::Pose, tc::TriggerSource};

pub use params::*;
pub use state::*;
pub use targets::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of the grasp cycle the arm is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GraspPhase {
    Idle,
    ApproachPlanned,
    Approaching,
    Grasping,
    Returning,
    Released,
}

/// Result of handling a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The trigger value was false.
    Ignored,

    /// A cycle or the watchdog held the arm, the trigger was dropped.
    Busy,

    /// The cycle stopped early. If the arm had already moved the watchdog brings it home.
    Aborted(AbortReason),

    /// The cycle ran to the end.
    Completed(CycleReport),
}

/// Why a cycle stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbortReason {
    /// The planner found no path to the target.
    Unreachable,

    /// No usable speed factor, for example because the execution time is shorter than the
    /// gripper closing allowance.
    InvalidSpeedFactor,

    /// The planner returned a malformed trajectory for the named motion.
    InvalidTrajectory(&'static str),
}

/// Errors which end a grasp cycle or prevent the controller being created.
#[derive(Debug, thiserror::Error)]
pub enum GraspCtrlError {
    #[error("Invalid grasp control parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid targets: {0}")]
    TargetsError(TargetsLoadError),

    #[error("Planner error: {0}")]
    PlannerError(PlannerError),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Which trigger started the cycle.
    pub source: TriggerSource,

    /// The grasp pose the arm was sent to.
    pub target_pose: Pose,

    /// The predicted X was too far from the nominal and was replaced.
    pub x_clamped: bool,

    /// Speed factor applied to the approach and gripper close.
    pub speed_factor: f64,

    /// Duration of the rescaled approach.
    ///
    /// Units: seconds
    pub approach_duration_s: f64,

    /// Number of motions the planner reported as failed. The cycle carries on after a failed
    /// motion.
    pub failed_motions: usize,
}
