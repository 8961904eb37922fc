//! # Frame Client
//!
//! Recieves frames from the conveyor camera. Only the newest frame is kept, a frame which could
//! not be processed in time is replaced by the next one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::cam::SensorFrame,
    net::{zmq, BusSocket, NetError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Camera frame client
pub struct FrameClient {
    socket: BusSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameClientError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a frame: {0}")]
    RecvError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameClient {
    /// Create a new instance of the frame client.
    ///
    /// This function will not block until the camera connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, FrameClientError> {
        let socket_options = SocketOptions {
            linger: 1,
            recv_timeout: 100,
            conflate: true,
            ..Default::default()
        };

        let socket = BusSocket::new(ctx, zmq::SUB, &socket_options, &params.frame_endpoint)
            .map_err(FrameClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Get the latest frame, or `None` if none arrived within the recieve timeout.
    pub fn recv_frame(&self) -> Result<Option<SensorFrame>, FrameClientError> {
        self.socket
            .recv_json()
            .map_err(FrameClientError::RecvError)
    }
}
