//! Logging setup for twinscan.
//!
//! Structured logging goes through the `log` facade with the `env_logger`
//! backend, always to stderr so stdout carries only the duplicate report.
//! The level is chosen by, in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! # Example
//!
//! ```rust,no_run
//! use twinscan::logging::init_logging;
//!
//! // -v: debug output
//! init_logging(1, false).ok();
//! log::debug!("Debug info here");
//! ```

use env_logger::{Builder, Target};
use log::{LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

/// Install the global logger based on CLI verbosity flags.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger was already installed in this
/// process.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<(), SetLoggerError> {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);

    let level = determine_level(verbose, quiet);
    match rust_log {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(level);
        }
    }

    configure_format(&mut builder, verbose);
    builder.try_init()?;

    match rust_log {
        Some(filter) => log::debug!("Logging configured from RUST_LOG={}", filter),
        None => log::debug!("Logging initialized at level: {:?}", level),
    }
    Ok(())
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Debug builds and verbose runs get timestamps and module paths; otherwise
/// only the level and message are printed.
fn configure_format(builder: &mut Builder, verbose: u8) {
    let detailed = cfg!(debug_assertions) || verbose >= 1;

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        if detailed {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        }
    });
}

/// Name of the maximum enabled log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
