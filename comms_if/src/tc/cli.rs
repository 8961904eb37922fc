//! # Operator command line arguments
//!
//! Arguments for the bench tools which send telecommands to the grasp executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use structopt::StructOpt;

use super::{SetDurationRequest, TriggerMsg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arguments of `send_trigger`.
#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(name = "send_trigger", about = "Publish a single grasp trigger")]
pub struct SendTriggerArgs {
    /// Endpoint to bind the publisher to, e.g. `tcp://*:5010`
    pub endpoint: String,

    /// Trigger value, `false` sends a no-op trigger
    #[structopt(long, default_value = "true", parse(try_from_str))]
    pub value: bool,
}

/// Arguments of `set_duration`.
#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(name = "set_duration", about = "Request a new trajectory execution time")]
pub struct SetDurationArgs {
    /// Endpoint of the duration server, e.g. `tcp://localhost:5030`
    pub endpoint: String,

    /// Execution time in seconds
    pub duration_s: f64,
}

impl SendTriggerArgs {
    pub fn msg(&self) -> TriggerMsg {
        TriggerMsg { data: self.value }
    }
}

impl SetDurationArgs {
    pub fn request(&self) -> SetDurationRequest {
        SetDurationRequest {
            duration_s: self.duration_s,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
