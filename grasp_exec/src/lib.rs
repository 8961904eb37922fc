//! # Grasp library.
//!
//! Closed loop control of a pick and place arm grasping objects from a moving conveyor. The
//! executable (`grasp_exec`) wires these modules to the message bus; everything with behaviour
//! lives here so it can be tested without the bus or the planning service.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pose estimator - converts localiser pixel estimates into world frame target points
pub mod estimator;

/// Localiser - finds the target in a camera image
pub mod localiser;

/// Tracker - keeps the latest target observation and a velocity estimate
pub mod tracker;

/// Target pose prediction - extrapolates the tracked target to the grasp time
pub mod predict;

/// Trajectory utilities - time rescaling and validation
pub mod traj;

/// Execution guard - non-blocking exclusive access to the arm
pub mod guard;

/// Duration configuration - execution time and derived speed factor
pub mod duration;

/// Grasp control - the approach, grasp, return and release cycle
pub mod grasp_ctrl;

/// Watchdog - periodically returns an idle arm to its home configuration
pub mod watchdog;

/// Motion planner interface and the client for the planning service
pub mod planner;

/// Frame client - recieves camera frames from the bus
pub mod frame_client;

/// Trigger client - recieves grasp triggers from the bus
pub mod trigger_client;

/// Duration server - answers execution time change requests
pub mod duration_server;

/// Telemetry server - publishes the controller's configuration
pub mod tm_server;
