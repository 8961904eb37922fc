//! Logger setup shared by the grasp executables.
//!
//! Every line carries the session time and level. Debug and trace lines also carry the name of
//! the thread and the module target, since the grasp executable runs the tracker, trigger
//! handlers and watchdog on separate threads.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use std::str::FromStr;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Level configuration for the logger.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
    /// Level applied to every module without an override. Must be `Info` or more verbose.
    pub min_level: LevelFilter,

    /// Per-module overrides as `(module path, level)`, applied in order.
    pub module_levels: Vec<(String, LevelFilter)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Invalid module level directive `{0}`, expected `module=level`")]
    InvalidModuleLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoggerConfig {
    /// Config with no module overrides.
    pub fn new(min_level: LevelFilter) -> Self {
        Self {
            min_level,
            module_levels: Vec::new(),
        }
    }

    /// Parse comma separated `module=level` directives, for example
    /// `grasp_lib::tracker=trace,grasp_lib::watchdog=info`.
    pub fn with_directives(mut self, directives: &str) -> Result<Self, LoggerInitError> {
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let mut parts = directive.splitn(2, '=');
            let module = parts.next().map(str::trim).unwrap_or("");
            let level = parts
                .next()
                .and_then(|l| LevelFilter::from_str(l.trim()).ok())
                .ok_or_else(|| LoggerInitError::InvalidModuleLevel(directive.to_string()))?;

            if module.is_empty() {
                return Err(LoggerInitError::InvalidModuleLevel(directive.to_string()));
            }

            self.module_levels.push((module.to_string(), level));
        }

        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `config.min_level` must be greater than `log::Level::Info`. Module overrides may be quieter.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    config: &LoggerConfig,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if config.min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(config.min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            if record.level() > log::Level::Info {
                let thread = std::thread::current();
                out.finish(format_args!(
                    "[{:10.6} {}] ({}) {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    thread.name().unwrap_or("-"),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(config.min_level)
        .level_for("zmq", LevelFilter::Info);

    for (module, level) in config.module_levels.iter() {
        dispatch = dispatch.level_for(module.clone(), *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", config.min_level);
    for (module, level) in config.module_levels.iter() {
        info!("    {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
