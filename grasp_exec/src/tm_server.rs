//! # TM Server
//!
//! Publishes the controller's telemetry on the bus.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;

use comms_if::{
    net::{zmq, BusSocket, NetError, NetParams, SocketOptions},
    tm::TmPacket,
};

use crate::watchdog::TmSink;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: BusSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not send telemetry: {0}")]
    SendError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TmServerError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = BusSocket::new(ctx, zmq::PUB, &socket_options, &params.tm_endpoint)
            .map_err(TmServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Send a telemetry packet.
    pub fn send(&mut self, packet: &TmPacket) -> Result<(), TmServerError> {
        self.socket
            .send_json(packet)
            .map_err(TmServerError::SendError)
    }
}

impl TmSink for TmServer {
    fn publish(&mut self, packet: &TmPacket) {
        if let Err(e) = self.send(packet) {
            warn!("Could not publish telemetry: {}", e);
        }
    }
}
