//! # Network Module
//!
//! This module provides the message bus sockets, a thin layer over ZMQ carrying JSON encoded
//! messages.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoints of every socket used by the grasp executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Publisher of the adaptive grasp trigger
    pub adaptive_trigger_endpoint: String,

    /// Publisher of the reactive grasp trigger
    pub reactive_trigger_endpoint: String,

    /// Publisher of the conveyor camera frames
    pub frame_endpoint: String,

    /// Endpoint the duration change service binds to
    pub duration_endpoint: String,

    /// Endpoint the telemetry publisher binds to
    pub tm_endpoint: String,

    /// The motion planning service
    pub planner_endpoint: String,
}

/// A zmq socket carrying JSON messages.
pub struct BusSocket {
    socket: Socket,
}

/// Represents options which can be set on a bus socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Servers should have this value
    /// set as `true`, clients should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_CONFLATE`: Keep only the last message in the queue. Useful for sensor streams where
    /// only the newest sample matters.
    pub conflate: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not send a message: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Timed out waiting for a message")]
    Timeout,

    #[error("Recieved a message which was not valid UTF-8")]
    NonUtf8Message,

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the message: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusSocket {
    /// Create a new bus socket.
    ///
    /// SUB sockets are subscribed to every message on the endpoint.
    ///
    /// ## Arguments
    /// - `ctx`: the zmq context which will be used to create the socket
    /// - `socket_type`: the type of zmq socket to create
    /// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
    /// - `endpoint`: a zmq endpoint string, such as `"tcp://localhost:4000"`
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: &SocketOptions,
        endpoint: &str,
    ) -> Result<Self, NetError> {
        let socket = ctx
            .socket(socket_type)
            .map_err(NetError::CreateSocketError)?;

        socket_options.set(&socket)?;

        if let zmq::SUB = socket_type {
            set_sockopts!(socket, (set_subscribe, b""));
        }

        // Connect or bind the socket to it's endpoint
        match socket_options.bind {
            false => socket.connect(endpoint),
            true => socket.bind(endpoint),
        }
        .map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

        Ok(Self { socket })
    }

    /// Serialize and send a message.
    pub fn send_json<T: Serialize>(&self, msg: &T) -> Result<(), NetError> {
        let msg_str = serde_json::to_string(msg).map_err(NetError::SerializationError)?;

        self.socket
            .send(msg_str.as_str(), 0)
            .map_err(NetError::SendError)
    }

    /// Recieve and deserialize a message.
    ///
    /// Returns `Ok(None)` if no message arrived before the socket's recieve timeout.
    pub fn recv_json<T: DeserializeOwned>(&self) -> Result<Option<T>, NetError> {
        let msg_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(NetError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(NetError::RecvError(e)),
        };

        trace!("Recieved {} bytes", msg_str.len());

        serde_json::from_str(&msg_str)
            .map(Some)
            .map_err(NetError::DeserializeError)
    }

    /// Send a request and wait for the reply, as a REQ socket must.
    ///
    /// A reply not arriving within the recieve timeout is a `NetError::Timeout`.
    pub fn request<Q: Serialize, R: DeserializeOwned>(&self, request: &Q) -> Result<R, NetError> {
        self.send_json(request)?;

        match self.recv_json()? {
            Some(r) => Ok(r),
            None => Err(NetError::Timeout),
        }
    }
}

impl std::ops::Deref for BusSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_linger, self.linger),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        if self.conflate {
            set_sockopts!(socket, (set_conflate, true));
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            linger: 30_000,
            connect_timeout: 0,
            recv_timeout: -1,
            send_timeout: -1,
            conflate: false,
        }
    }
}
