//! # Watchdog
//!
//! Makes sure the arm isn't left stuck away from home. On every tick the current duration
//! configuration is published, then, if no cycle is running, the arm is sent home and the gripper
//! opened.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use comms_if::tm::TmPacket;

use crate::{
    grasp_ctrl::{GraspCtrl, GraspCtrlError},
    planner::MotionPlanner,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Somewhere to send telemetry.
pub trait TmSink {
    /// Publish a packet. Telemetry is best effort, failures are handled by the sink.
    fn publish(&mut self, packet: &TmPacket);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What the watchdog did on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// A cycle held the arm, nothing was commanded.
    Busy,

    /// The arm was commanded home and the gripper open.
    Homed,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run one watchdog tick.
///
/// `session_time_s` is stamped on the telemetry packet. Telemetry is published before the arm is
/// touched, whether or not it is busy.
pub fn tick<P, S>(
    ctrl: &GraspCtrl<P>,
    sink: &mut S,
    session_time_s: f64,
) -> Result<WatchdogOutcome, GraspCtrlError>
where
    P: MotionPlanner,
    S: TmSink + ?Sized,
{
    let cfg = ctrl.duration_config();

    sink.publish(&TmPacket {
        session_time_s,
        execution_time_s: cfg.execution_time_s,
        speed_factor: cfg.speed_factor,
    });

    if ctrl.make_safe()? {
        trace!("Watchdog homed the arm");
        Ok(WatchdogOutcome::Homed)
    } else {
        trace!("Watchdog skipped, arm busy");
        Ok(WatchdogOutcome::Busy)
    }
}

impl TmSink for Vec<TmPacket> {
    fn publish(&mut self, packet: &TmPacket) {
        self.push(*packet);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
