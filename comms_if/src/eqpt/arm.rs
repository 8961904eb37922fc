//! # Arm Equipment Communications Module
//!
//! Geometry and trajectory types shared between the grasp executable and the planning service.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point in 3D space.
///
/// Units: meters
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// An orientation quaternion, scalar part last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// An end effector pose in the robot base frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

/// A single waypoint of a joint trajectory.
///
/// `positions`, `velocities` and `accelerations` are indexed in the same order as the owning
/// trajectory's `joint_names`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Units: radians (revolute) or meters (prismatic)
    pub positions: Vec<f64>,

    #[serde(default)]
    pub velocities: Vec<f64>,

    #[serde(default)]
    pub accelerations: Vec<f64>,

    /// Time at which this waypoint is reached, measured from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_from_start_s: f64,
}

/// A joint space trajectory as produced by the planning service.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub joint_names: Vec<String>,
    pub points: Vec<TrajectoryPoint>,
}

/// Joint positions keyed by joint name.
pub type JointState = BTreeMap<String, f64>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The planning groups of the manipulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanningGroup {
    /// The arm itself, from the base up to the flange.
    Arm,

    /// The prismatic gripper fingers.
    Gripper,
}

/// A target the planning service can plan or move towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanTarget {
    /// An end effector pose.
    Pose(Pose),

    /// A full joint configuration.
    Joints(JointState),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl Trajectory {
    /// Number of waypoints in the trajectory.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the trajectory has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time from start of the final waypoint, or `None` for an empty trajectory.
    pub fn duration_s(&self) -> Option<f64> {
        self.points.last().map(|p| p.time_from_start_s)
    }
}
