//! Parameters structure for GraspCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::planner::ConnectParams;
use comms_if::eqpt::arm::Point;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the grasp controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Index into the down poses and down trajectories of the targets document of the slot over
    /// the conveyor used for grasping.
    pub trajectory_index: usize,

    /// Position of the robot base in the world frame.
    ///
    /// Units: meters
    pub robot_origin: Point,

    /// Largest distance in X the predicted grasp pose may be from the nominal down pose before
    /// the nominal X is used instead.
    ///
    /// Units: meters
    pub x_tolerance_m: f64,

    /// Height of the pre-grasp waypoint above the grasp pose.
    ///
    /// Units: meters
    pub approach_height_m: f64,

    /// How the approach motion is planned.
    pub approach_mode: ApproachMode,

    /// Maximum end effector step between Cartesian path points.
    ///
    /// Units: meters
    pub cartesian_eef_step_m: f64,

    /// Joint space jump threshold for Cartesian paths, 0 disables the check.
    pub cartesian_jump_threshold: f64,

    /// Time kept back from the execution time to close the gripper, Cartesian approach.
    ///
    /// Units: seconds
    pub cartesian_closing_allowance_s: f64,

    /// Time kept back from the execution time to close the gripper, direct approach.
    ///
    /// Units: seconds
    pub direct_closing_allowance_s: f64,

    /// Speed factor applied to the return motion.
    pub return_speed: f64,

    /// Execution time used until a duration change request is recieved.
    ///
    /// Units: seconds
    pub initial_execution_time_s: f64,

    /// Time the session is held after a completed cycle.
    ///
    /// Units: seconds
    pub settle_time_s: f64,

    /// Period of the watchdog.
    ///
    /// Units: seconds
    pub watchdog_period_s: f64,

    /// Name of the closed gripper target in the robot description.
    pub gripper_closed_target: String,

    /// Name of the open gripper target in the robot description.
    pub gripper_open_target: String,

    /// Connection to the planning service.
    pub planner: ConnectParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The way the arm approaches the grasp pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproachMode {
    /// Cartesian path through a pre-grasp waypoint above the target, then down onto it.
    CartesianPath,

    /// Joint space plan straight to the grasp pose.
    Direct,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            trajectory_index: 13,
            robot_origin: Point {
                x: 1.0,
                y: -0.75,
                z: 0.8,
            },
            x_tolerance_m: 0.15,
            approach_height_m: 0.3,
            approach_mode: ApproachMode::CartesianPath,
            cartesian_eef_step_m: 5.0,
            cartesian_jump_threshold: 0.0,
            cartesian_closing_allowance_s: 0.15,
            direct_closing_allowance_s: 0.1,
            return_speed: 1.0,
            initial_execution_time_s: 0.5,
            settle_time_s: 0.01,
            watchdog_period_s: 1.0,
            gripper_closed_target: String::from("gripper_closed"),
            gripper_open_target: String::from("gripper_open"),
            planner: ConnectParams::default(),
        }
    }
}

impl Params {
    /// Time kept back for closing the gripper in the configured approach mode.
    pub fn closing_allowance_s(&self) -> f64 {
        match self.approach_mode {
            ApproachMode::CartesianPath => self.cartesian_closing_allowance_s,
            ApproachMode::Direct => self.direct_closing_allowance_s,
        }
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("x_tolerance_m", self.x_tolerance_m),
            ("cartesian_closing_allowance_s", self.cartesian_closing_allowance_s),
            ("direct_closing_allowance_s", self.direct_closing_allowance_s),
            ("settle_time_s", self.settle_time_s),
            ("cartesian_jump_threshold", self.cartesian_jump_threshold),
            ("planner.retry_delay_s", self.planner.retry_delay_s),
        ];
        for (name, value) in non_negative.iter() {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(format!("{} must be finite and >= 0, found {}", name, value));
            }
        }

        let positive = [
            ("return_speed", self.return_speed),
            ("initial_execution_time_s", self.initial_execution_time_s),
            ("watchdog_period_s", self.watchdog_period_s),
            ("cartesian_eef_step_m", self.cartesian_eef_step_m),
        ];
        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(format!("{} must be finite and > 0, found {}", name, value));
            }
        }

        if !self.approach_height_m.is_finite() {
            return Err(String::from("approach_height_m must be finite"));
        }

        if self.planner.max_attempts == 0 {
            return Err(String::from("planner.max_attempts must be at least 1"));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
