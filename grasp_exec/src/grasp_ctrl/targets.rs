//! Startup targets document
//!
//! Poses, joint states and trajectories recorded for the cell. Loaded once from a JSON file at
//! startup and never modified.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::traj::{self, TrajectoryError};
use comms_if::eqpt::arm::{JointState, Pose, Trajectory};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Recorded targets for the cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraspTargets {
    /// End effector pose of the home configuration.
    #[serde(alias = "up_pose")]
    pub home_pose: Pose,

    /// Joint state of the home configuration, which the arm returns to after every grasp and
    /// whenever it is idle.
    #[serde(alias = "up_joint_state")]
    pub home_joint_state: JointState,

    /// Grasp poses over the conveyor, one per trajectory slot.
    pub down_poses: Vec<Pose>,

    /// Recorded trajectories from home to each down pose.
    pub down_trajectories: Vec<Trajectory>,

    /// Recorded trajectories from each down pose back home.
    pub up_trajectories: Vec<Trajectory>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TargetsLoadError {
    #[error("Could not read the targets file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Could not deserialise the targets file: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("The home joint state is empty")]
    EmptyHomeJointState,

    #[error("Trajectory index {index} is out of range, there are only {len} {what}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        what: &'static str,
    },

    #[error("The reference down trajectory {0} is empty")]
    EmptyReference(usize),

    #[error("{what} {index} is invalid: {error}")]
    InvalidTrajectory {
        what: &'static str,
        index: usize,
        error: TrajectoryError,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GraspTargets {
    /// Load the targets from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TargetsLoadError> {
        let json = fs::read_to_string(path).map_err(TargetsLoadError::FileLoadError)?;

        Self::from_json(&json)
    }

    /// Parse the targets from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TargetsLoadError> {
        serde_json::from_str(json).map_err(TargetsLoadError::DeserialiseError)
    }

    /// Check the targets can be used with the given trajectory index.
    pub fn validate(&self, index: usize) -> Result<(), TargetsLoadError> {
        if self.home_joint_state.is_empty() {
            return Err(TargetsLoadError::EmptyHomeJointState);
        }

        if index >= self.down_poses.len() {
            return Err(TargetsLoadError::IndexOutOfRange {
                index,
                len: self.down_poses.len(),
                what: "down poses",
            });
        }

        if index >= self.down_trajectories.len() {
            return Err(TargetsLoadError::IndexOutOfRange {
                index,
                len: self.down_trajectories.len(),
                what: "down trajectories",
            });
        }

        for (what, trajs) in [
            ("Down trajectory", &self.down_trajectories),
            ("Up trajectory", &self.up_trajectories),
        ]
        .iter()
        {
            for (i, t) in trajs.iter().enumerate() {
                traj::validate(t).map_err(|error| TargetsLoadError::InvalidTrajectory {
                    what: *what,
                    index: i,
                    error,
                })?;
            }
        }

        if self.down_trajectories[index].is_empty() {
            return Err(TargetsLoadError::EmptyReference(index));
        }

        Ok(())
    }

    /// Nominal grasp pose of a slot.
    pub fn down_pose(&self, index: usize) -> Option<&Pose> {
        self.down_poses.get(index)
    }

    /// Duration of the recorded trajectory to a slot, used as the reference when deriving speed
    /// factors.
    pub fn reference_duration_s(&self, index: usize) -> Option<f64> {
        self.down_trajectories.get(index)?.duration_s()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
