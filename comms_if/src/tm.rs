//! # Telemetry module

use serde::{Deserialize, Serialize};

/// Telemetry packet published by the grasp executable on every watchdog tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TmPacket {
    /// Seconds since the start of the session.
    pub session_time_s: f64,

    /// The currently configured trajectory execution time.
    ///
    /// Units: seconds
    pub execution_time_s: f64,

    /// Speed factor derived from the reference trajectory and the execution time, `None` if it
    /// could not be derived.
    pub speed_factor: Option<f64>,
}
