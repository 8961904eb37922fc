//! # Duration Server
//!
//! Answers requests to change the execution time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

use comms_if::{
    net::{zmq, BusSocket, NetError, NetParams, SocketOptions},
    tc::{SetDurationRequest, SetDurationResponse},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Duration change server
pub struct DurationServer {
    socket: BusSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DurationServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a request: {0}")]
    RecvError(NetError),

    #[error("Recieved an invalid request: {0}")]
    InvalidRequest(NetError),

    #[error("Could not send the response: {0}")]
    SendError(NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DurationServer {
    /// Create a new instance of the duration server, bound to the duration endpoint.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, DurationServerError> {
        Self::with_endpoint(ctx, &params.duration_endpoint)
    }

    /// Create a new instance bound to a specific endpoint.
    pub fn with_endpoint(ctx: &zmq::Context, endpoint: &str) -> Result<Self, DurationServerError> {
        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            recv_timeout: 100,
            send_timeout: 100,
            ..Default::default()
        };

        let socket = BusSocket::new(ctx, zmq::REP, &socket_options, endpoint)
            .map_err(DurationServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Wait for one request and answer it with the result of `handler`.
    ///
    /// Returns `Ok(None)` if no request arrived within the recieve timeout. A request which
    /// cannot be parsed is answered with a failure before the error is returned, so the socket
    /// is always ready for the next request.
    pub fn serve_one<F>(
        &self,
        handler: F,
    ) -> Result<Option<SetDurationResponse>, DurationServerError>
    where
        F: FnOnce(f64) -> bool,
    {
        let request: SetDurationRequest = match self.socket.recv_json() {
            Ok(Some(r)) => r,
            Ok(None) => return Ok(None),
            Err(e @ NetError::DeserializeError(_)) | Err(e @ NetError::NonUtf8Message) => {
                self.respond(SetDurationResponse { success: false })?;
                return Err(DurationServerError::InvalidRequest(e));
            }
            Err(e) => return Err(DurationServerError::RecvError(e)),
        };

        debug!("Duration change to {} s requested", request.duration_s);

        let response = SetDurationResponse {
            success: handler(request.duration_s),
        };
        self.respond(response)?;

        Ok(Some(response))
    }

    fn respond(&self, response: SetDurationResponse) -> Result<(), DurationServerError> {
        self.socket
            .send_json(&response)
            .map_err(DurationServerError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
