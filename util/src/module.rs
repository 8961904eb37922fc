//! Module interfaces
//!
//! Cyclic processing modules in `grasp_exec` (for example the target tracker)
//! implement the `State` trait so that they are initialised from a parameter
//! file and then fed one input at a time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data required during initialisation, usually a parameter file path.
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// Data consumed by one call to `proc`.
    type InputData;
    /// Data produced by one call to `proc`.
    type OutputData;
    /// What happened during the call, for monitoring.
    type StatusReport;
    /// An error which can occur during processing.
    type ProcError;

    /// Initialise the module.
    ///
    /// The session is given so the module can open archives in the session
    /// directory.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one input.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
