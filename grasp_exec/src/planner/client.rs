//! # Planner client
//!
//! Connects to the motion planning service over a REQ socket.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{thread, time::Duration};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use comms_if::{
    eqpt::{
        arm::{JointState, PlanTarget, PlanningGroup, Pose, Trajectory},
        planner::{PlannerRequest, PlannerResponse},
    },
    net::{zmq, BusSocket, NetError, SocketOptions},
};

use super::{MotionPlanner, PlannerError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the planning service.
pub struct PlannerClient {
    socket: BusSocket,
}

/// How to connect to the planning service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectParams {
    /// Number of connection attempts before giving up.
    pub max_attempts: usize,

    /// Delay between attempts.
    ///
    /// Units: seconds
    pub retry_delay_s: f64,

    /// How long to wait for the planner to answer a ping during connection.
    ///
    /// Units: milliseconds
    pub ping_timeout_ms: i32,

    /// How long to wait for any other answer. Execution requests only return once the motion is
    /// complete, so this must be longer than the slowest motion, or -1 to wait forever.
    ///
    /// Units: milliseconds
    pub request_timeout_ms: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay_s: 1.0,
            ping_timeout_ms: 1000,
            request_timeout_ms: -1,
        }
    }
}

impl PlannerClient {
    /// Connect to the planning service.
    ///
    /// The service is available once it answers a ping for both the arm and the gripper groups.
    /// A REQ socket which missed its reply cannot send again, so each attempt uses a fresh
    /// socket.
    pub fn connect(
        ctx: &zmq::Context,
        endpoint: &str,
        params: &ConnectParams,
    ) -> Result<Self, PlannerError> {
        let retry_delay = Duration::from_secs_f64(params.retry_delay_s.max(0.0));

        for attempt in 1..=params.max_attempts {
            match Self::try_connect(ctx, endpoint, params) {
                Ok(client) => {
                    info!("Connected to the planner at {}", endpoint);
                    return Ok(client);
                }
                Err(e) => {
                    warn!(
                        "Planner not available ({}), attempt {} of {}. Retrying...",
                        e, attempt, params.max_attempts
                    );
                }
            }

            if attempt < params.max_attempts {
                thread::sleep(retry_delay);
            }
        }

        Err(PlannerError::Unavailable {
            attempts: params.max_attempts,
        })
    }

    fn try_connect(
        ctx: &zmq::Context,
        endpoint: &str,
        params: &ConnectParams,
    ) -> Result<Self, PlannerError> {
        let socket = BusSocket::new(
            ctx,
            zmq::REQ,
            &SocketOptions {
                linger: 0,
                recv_timeout: params.ping_timeout_ms,
                send_timeout: params.ping_timeout_ms,
                ..Default::default()
            },
            endpoint,
        )
        .map_err(PlannerError::Net)?;

        let mut client = Self { socket };

        for group in &[PlanningGroup::Arm, PlanningGroup::Gripper] {
            if !client.ping(*group)? {
                return Err(PlannerError::Remote(format!(
                    "{:?} group is not loaded",
                    group
                )));
            }
        }

        client
            .socket
            .set_rcvtimeo(params.request_timeout_ms)
            .map_err(|e| PlannerError::Net(NetError::SocketOptionError("rcvtimeo".into(), e)))?;
        client
            .socket
            .set_sndtimeo(params.request_timeout_ms)
            .map_err(|e| PlannerError::Net(NetError::SocketOptionError("sndtimeo".into(), e)))?;

        Ok(client)
    }

    fn ping(&mut self, group: PlanningGroup) -> Result<bool, PlannerError> {
        match self.request(&PlannerRequest::Ping { group })? {
            PlannerResponse::Success(s) => Ok(s),
            _ => Err(PlannerError::UnexpectedResponse("Ping")),
        }
    }

    /// Send a request and unpack remote errors.
    fn request(&mut self, request: &PlannerRequest) -> Result<PlannerResponse, PlannerError> {
        debug!("Planner request: {}", request_name(request));

        match self.socket.request(request).map_err(PlannerError::Net)? {
            PlannerResponse::Error(e) => Err(PlannerError::Remote(e)),
            r => Ok(r),
        }
    }

    fn request_trajectory(
        &mut self,
        request: &PlannerRequest,
    ) -> Result<Trajectory, PlannerError> {
        match self.request(request)? {
            PlannerResponse::Trajectory(t) => Ok(t),
            _ => Err(PlannerError::UnexpectedResponse(request_name(request))),
        }
    }

    fn request_success(&mut self, request: &PlannerRequest) -> Result<bool, PlannerError> {
        match self.request(request)? {
            PlannerResponse::Success(s) => Ok(s),
            _ => Err(PlannerError::UnexpectedResponse(request_name(request))),
        }
    }
}

impl MotionPlanner for PlannerClient {
    fn plan_cartesian_path(
        &mut self,
        group: PlanningGroup,
        waypoints: &[Pose],
        eef_step_m: f64,
        jump_threshold: f64,
    ) -> Result<Trajectory, PlannerError> {
        self.request_trajectory(&PlannerRequest::CartesianPath {
            group,
            waypoints: waypoints.to_vec(),
            eef_step_m,
            jump_threshold,
        })
    }

    fn plan(
        &mut self,
        group: PlanningGroup,
        target: &PlanTarget,
    ) -> Result<Trajectory, PlannerError> {
        self.request_trajectory(&PlannerRequest::Plan {
            group,
            target: target.clone(),
        })
    }

    fn execute(
        &mut self,
        group: PlanningGroup,
        trajectory: &Trajectory,
    ) -> Result<bool, PlannerError> {
        self.request_success(&PlannerRequest::Execute {
            group,
            trajectory: trajectory.clone(),
        })
    }

    fn go(&mut self, group: PlanningGroup, target: &PlanTarget) -> Result<bool, PlannerError> {
        self.request_success(&PlannerRequest::Go {
            group,
            target: target.clone(),
        })
    }

    fn named_target_values(
        &mut self,
        group: PlanningGroup,
        name: &str,
    ) -> Result<JointState, PlannerError> {
        let request = PlannerRequest::NamedTargetValues {
            group,
            name: name.into(),
        };

        match self.request(&request)? {
            PlannerResponse::JointState(j) => Ok(j),
            _ => Err(PlannerError::UnexpectedResponse(request_name(&request))),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn request_name(request: &PlannerRequest) -> &'static str {
    match request {
        PlannerRequest::Ping { .. } => "Ping",
        PlannerRequest::CartesianPath { .. } => "CartesianPath",
        PlannerRequest::Plan { .. } => "Plan",
        PlannerRequest::Execute { .. } => "Execute",
        PlannerRequest::Go { .. } => "Go",
        PlannerRequest::NamedTargetValues { .. } => "NamedTargetValues",
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
