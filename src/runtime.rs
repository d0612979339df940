//! Process-wide setup and teardown for the binary.
//!
//! [`Runtime`] owns everything global: the installed logger and the run
//! clock. The pipeline itself takes its configuration explicitly and never
//! reaches for process state.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::logging;

/// Scope of one process run. Create it first in `main`, shut it down last.
#[derive(Debug)]
pub struct Runtime {
    started: Instant,
    show_progress: bool,
}

impl Runtime {
    /// Install logging and start the run clock.
    ///
    /// A logger that is already installed (as in tests) is kept.
    #[must_use]
    pub fn initialize(verbose: u8, quiet: bool) -> Self {
        if let Err(e) = logging::init_logging(verbose, quiet) {
            log::debug!("Keeping existing logger: {}", e);
        }
        log::debug!(
            "twinscan {} starting (log level {})",
            env!("CARGO_PKG_VERSION"),
            logging::current_level_name()
        );

        Self {
            started: Instant::now(),
            show_progress: verbose >= 1 && !quiet,
        }
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Time since [`Runtime::initialize`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Flush standard streams and log the run time.
    pub fn shutdown(self) {
        if let Err(e) = std::io::stdout().flush() {
            log::warn!("Failed to flush stdout: {}", e);
        }
        log::debug!("Finished in {:.2?}", self.elapsed());
        log::logger().flush();
        let _ = std::io::stderr().flush();
    }
}
