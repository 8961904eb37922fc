//! Main grasp executable entry point.
//!
//! # Architecture
//!
//! The executable is event driven, each source of events has its own thread:
//!
//!     - Frame thread: recieves camera frames and updates the tracker
//!     - Trigger threads (adaptive and reactive): run a grasp cycle for each trigger, dropping
//!       triggers which arrive while the arm is busy
//!     - Duration thread: answers execution time change requests
//!     - Main thread: the watchdog, publishing telemetry and homing an idle arm every period
//!
//! Errors from the planner during a cycle are fatal. They are passed to the main thread, which
//! stops the executable.
//!
//! # Usage
//!
//!     grasp_exec [--log-level <level>] [--log-modules <module=level,...>] <targets.json>

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::{
    path::PathBuf,
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use comms_if::{net::NetParams, tc::TriggerSource};
use grasp_lib::{
    duration_server::{DurationServer, DurationServerError},
    frame_client::FrameClient,
    grasp_ctrl::{self, CycleOutcome, GraspCtrl, GraspTargets},
    planner::{MotionPlanner, PlannerClient},
    tm_server::TmServer,
    tracker::Tracker,
    trigger_client::TriggerClient,
    watchdog,
};
use util::{
    host,
    logger::{logger_init, LevelFilter, LoggerConfig},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments.
#[derive(Debug, StructOpt)]
#[structopt(name = "grasp_exec", about = "Adaptive conveyor grasp executable")]
struct Args {
    /// Path to the grasp targets JSON file
    #[structopt(parse(from_os_str))]
    targets: PathBuf,

    /// Minimum log level, `info` or more verbose
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Per-module log levels, e.g. `grasp_lib::tracker=trace,grasp_lib::watchdog=info`
    #[structopt(long, default_value = "")]
    log_modules: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let args = Args::from_args();

    // Initialise session
    let session =
        Session::new("grasp_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_config = LoggerConfig::new(args.log_level)
        .with_directives(&args.log_modules)
        .wrap_err("Invalid log module levels")?;
    logger_init(&log_config, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Conveyor Grasp Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let ctrl_params: grasp_ctrl::Params =
        util::params::load("grasp_ctrl.toml").wrap_err("Could not load grasp control params")?;

    debug!("CLI arguments: {:?}", args);

    info!("Loading targets from {:?}", args.targets);
    let targets = GraspTargets::load(&args.targets).wrap_err("Failed to load the targets")?;
    info!(
        "Loaded {} down poses, using trajectory {}",
        targets.down_poses.len(),
        ctrl_params.trajectory_index
    );

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut tracker = Tracker::default();
    tracker
        .init("tracker.toml", &session)
        .wrap_err("Failed to initialise the Tracker")?;
    info!("Tracker init complete");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let planner = PlannerClient::connect(
        &zmq_ctx,
        &net_params.planner_endpoint,
        &ctrl_params.planner,
    )
    .wrap_err("Failed to connect to the planner")?;
    info!("PlannerClient connected");

    let watchdog_period = Duration::from_secs_f64(ctrl_params.watchdog_period_s);

    let ctrl = Arc::new(
        GraspCtrl::new(ctrl_params, targets, tracker.shared_state(), planner)
            .wrap_err("Failed to initialise GraspCtrl")?,
    );
    info!("GraspCtrl init complete");

    let frame_client =
        FrameClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise FrameClient")?;
    info!("FrameClient initialised");

    let mut trigger_clients = Vec::new();
    for source in [TriggerSource::Adaptive, TriggerSource::Reactive].iter() {
        trigger_clients.push(
            TriggerClient::new(&zmq_ctx, &net_params, *source)
                .wrap_err_with(|| format!("Failed to initialise the {:?} TriggerClient", source))?,
        );
    }
    info!("TriggerClients initialised");

    let duration_server = DurationServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise DurationServer")?;
    info!("DurationServer initialised");

    let mut tm_server =
        TmServer::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise TmServer")?;
    info!("TmServer initialised");

    info!("Network initialisation complete\n");

    // ---- MOVE TO HOME ----

    ctrl.move_home()
        .wrap_err("Failed to move the arm to the home configuration")?;

    // ---- START WORKER THREADS ----

    let (fatal_tx, fatal_rx) = mpsc::channel::<Report>();

    {
        let fatal_tx = fatal_tx.clone();
        thread::Builder::new()
            .name("frame".into())
            .spawn(move || frame_thread(frame_client, tracker, fatal_tx))
            .wrap_err("Failed to spawn the frame thread")?;
    }

    for client in trigger_clients {
        let name = format!("trigger-{:?}", client.source()).to_lowercase();
        let ctrl = ctrl.clone();
        let fatal_tx = fatal_tx.clone();
        thread::Builder::new()
            .name(name)
            .spawn(move || trigger_thread(client, ctrl, fatal_tx))
            .wrap_err("Failed to spawn a trigger thread")?;
    }

    {
        let ctrl = ctrl.clone();
        thread::Builder::new()
            .name("duration".into())
            .spawn(move || duration_thread(duration_server, ctrl))
            .wrap_err("Failed to spawn the duration thread")?;
    }

    drop(fatal_tx);

    // ---- MAIN LOOP ----

    info!("Begining watchdog loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        watchdog::tick(&*ctrl, &mut tm_server, session::get_elapsed_seconds())
            .wrap_err("Failed to make the arm safe")?;

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Wait for the rest of the period, stopping early on a fatal error
        let wait = match watchdog_period.checked_sub(cycle_dur) {
            Some(d) => d,
            None => {
                warn!(
                    "Watchdog cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - watchdog_period.as_secs_f64()
                );
                Duration::from_secs(0)
            }
        };

        match fatal_rx.recv_timeout(wait) {
            Ok(report) => {
                error!("Fatal error, stopping: {}", report);
                return Err(report);
            }
            Err(RecvTimeoutError::Timeout) => (),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(eyre!("All worker threads have stopped"));
            }
        }
    }
}

/// Feed camera frames to the tracker.
fn frame_thread(client: FrameClient, mut tracker: Tracker, fatal_tx: mpsc::Sender<Report>) {
    loop {
        let frame = match client.recv_frame() {
            Ok(Some(f)) => f,
            Ok(None) => continue,
            Err(e) => {
                warn!("FrameClient error: {}", e);
                continue;
            }
        };

        if let Err(e) = tracker.proc(&frame) {
            fatal_tx
                .send(Report::new(e).wrap_err("Tracker processing failed"))
                .ok();
            return;
        }
    }
}

/// Run a grasp cycle for every trigger.
///
/// Each trigger is handled on its own thread so that this one is always ready to recieve the
/// next trigger, which is dropped straight away if the arm is still busy.
fn trigger_thread<P>(
    client: TriggerClient,
    ctrl: Arc<GraspCtrl<P>>,
    fatal_tx: mpsc::Sender<Report>,
) where
    P: MotionPlanner + Send + 'static,
{
    let source = client.source();

    loop {
        let msg = match client.recv_trigger() {
            Ok(Some(m)) => m,
            Ok(None) => continue,
            Err(e) => {
                warn!("{:?} TriggerClient error: {}", source, e);
                continue;
            }
        };

        let ctrl = ctrl.clone();
        let fatal_tx = fatal_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("cycle-{:?}", source).to_lowercase())
            .spawn(move || match ctrl.handle_trigger(source, &msg) {
                Ok(CycleOutcome::Aborted(reason)) => info!("Grasp cycle aborted: {:?}", reason),
                Ok(_) => (),
                Err(e) => {
                    fatal_tx
                        .send(Report::new(e).wrap_err("Grasp cycle failed"))
                        .ok();
                }
            });

        if let Err(e) = spawned {
            warn!("Could not start a grasp cycle for a {:?} trigger: {}", source, e);
        }
    }
}

/// Serve execution time change requests.
fn duration_thread<P>(server: DurationServer, ctrl: Arc<GraspCtrl<P>>)
where
    P: MotionPlanner,
{
    loop {
        match server.serve_one(|d| ctrl.set_execution_time(d)) {
            Ok(_) => (),
            Err(DurationServerError::InvalidRequest(e)) => {
                warn!("Invalid duration change request: {}", e)
            }
            Err(e) => warn!("DurationServer error: {}", e),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
