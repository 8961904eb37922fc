//! Publish a single grasp trigger, for bench testing the grasp executable.
//!
//! Usage: `send_trigger [--value <bool>] <endpoint>`, for example `send_trigger tcp://*:5010`.

use comms_if::{
    net::{BusSocket, SocketOptions},
    tc::cli::SendTriggerArgs,
};
use std::{thread, time::Duration};
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = SendTriggerArgs::from_args();

    let ctx = zmq::Context::new();

    let socket = BusSocket::new(
        &ctx,
        zmq::PUB,
        &SocketOptions {
            bind: true,
            linger: 1000,
            ..Default::default()
        },
        &args.endpoint,
    )?;

    // Give subscribers time to connect, PUB drops messages sent before they do
    thread::sleep(Duration::from_millis(500));

    socket.send_json(&args.msg())?;

    println!("Trigger ({}) sent on {}", args.value, args.endpoint);

    Ok(())
}
