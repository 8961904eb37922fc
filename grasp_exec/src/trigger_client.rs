//! # Trigger Client
//!
//! Recieves one of the grasp trigger signals.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, BusSocket, NetError, NetParams, SocketOptions},
    tc::{TriggerMsg, TriggerSource},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for a single trigger signal.
pub struct TriggerClient {
    socket: BusSocket,
    source: TriggerSource,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TriggerClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a trigger: {0}")]
    RecvError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TriggerClient {
    /// Create a new client for the given trigger.
    ///
    /// This function will not block until the publisher connects.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        source: TriggerSource,
    ) -> Result<Self, TriggerClientError> {
        let endpoint = match source {
            TriggerSource::Adaptive => &params.adaptive_trigger_endpoint,
            TriggerSource::Reactive => &params.reactive_trigger_endpoint,
        };

        Self::with_endpoint(ctx, endpoint, source)
    }

    /// Create a new client subscribed to a specific endpoint.
    pub fn with_endpoint(
        ctx: &zmq::Context,
        endpoint: &str,
        source: TriggerSource,
    ) -> Result<Self, TriggerClientError> {
        // Triggers must not be conflated, a false trigger could replace a true one
        let socket_options = SocketOptions {
            linger: 1,
            recv_timeout: 100,
            ..Default::default()
        };

        let socket = BusSocket::new(ctx, zmq::SUB, &socket_options, endpoint)
            .map_err(TriggerClientError::SocketError)?;

        Ok(Self { socket, source })
    }

    /// The trigger this client listens to.
    pub fn source(&self) -> TriggerSource {
        self.source
    }

    /// Get the next trigger, or `None` if none arrived within the recieve timeout.
    pub fn recv_trigger(&self) -> Result<Option<TriggerMsg>, TriggerClientError> {
        self.socket
            .recv_json()
            .map_err(TriggerClientError::RecvError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
