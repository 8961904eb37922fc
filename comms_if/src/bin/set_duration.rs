//! Request a new trajectory execution time from the grasp executable.
//!
//! Usage: `set_duration <endpoint> <seconds>`, for example
//! `set_duration tcp://localhost:5030 0.8`.

use comms_if::{
    net::{BusSocket, SocketOptions},
    tc::{cli::SetDurationArgs, SetDurationResponse},
};
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SetDurationArgs::from_args();

    let ctx = zmq::Context::new();

    let socket = BusSocket::new(
        &ctx,
        zmq::REQ,
        &SocketOptions {
            connect_timeout: 1000,
            recv_timeout: 2000,
            linger: 1,
            ..Default::default()
        },
        &args.endpoint,
    )?;

    let response: SetDurationResponse = socket.request(&args.request())?;

    println!(
        "Set duration to {} s: success = {}",
        args.duration_s, response.success
    );

    Ok(())
}
