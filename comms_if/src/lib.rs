//! # Communications interface crate.
//!
//! Provides all the messages exchanged between the grasp executable and the
//! rest of the system, and the sockets used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Trigger and duration-change requests sent to the grasp executable
pub mod tc;

/// Telemetry published by the grasp executable
pub mod tm;

/// Message definitions for equipment (arm, camera, planning service)
pub mod eqpt;

/// Network module
pub mod net;
