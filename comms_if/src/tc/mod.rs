//! # Telecommand module
//!
//! Requests received by the grasp executable from the rest of the system.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Command line arguments of the operator bench tools
pub mod cli;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A grasp trigger signal. A `false` value is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMsg {
    pub data: bool,
}

/// Request to change the time the arm should take to reach the grasp pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetDurationRequest {
    /// Units: seconds
    pub duration_s: f64,
}

/// Response to a `SetDurationRequest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDurationResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The independent trigger signals which start a grasp cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSource {
    Adaptive,
    Reactive,
}
