//! Target tracking module
//!
//! Keeps the most recent observation of the target on the conveyor and an estimate of its
//! velocity from consecutive observations. The observation and velocity are shared with the
//! grasp controller, which reads them under the same lock to predict where the target will be.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
pub use target::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during Tracker operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Could not load the tracker parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid tracker parameters: {0}")]
    InvalidParams(String),

    #[error("Could not open the tracker archive: {0}")]
    ArchiveError(util::archive::ArchiveError),

    #[error("The tracker has no localiser, was it initialised?")]
    NoLocaliser,
}
