//! twinscan - find files with identical contents
//!
//! Files under the given roots are registered by size, digested only where
//! a size bucket holds three or more candidates, and confirmed as duplicates
//! by a full byte comparison. Confirmed groups are streamed as plain text.
//!
//! The pipeline runs in three phases, each consuming the previous one's
//! output: [`duplicates::DuplicateFinder::register`],
//! [`duplicates::DuplicateFinder::fingerprint`] and
//! [`duplicates::DuplicateFinder::resolve`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod runtime;
pub mod scanner;

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::{Config, RunConfiguration};
use crate::duplicates::{DuplicateFinder, ScanSummary};
use crate::error::ExitCode;
use crate::output::TextReporter;
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Run a scan for already-parsed arguments, writing the report to stdout.
///
/// Progress bars are drawn when `runtime` asks for them.
///
/// # Errors
///
/// Returns configuration, traversal, I/O and internal errors with context.
/// [`ExitCode::for_error`] maps them to exit codes.
pub fn run_app(cli: Cli, runtime: &Runtime) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();
    run_with_writer(&cli, stdout.lock(), runtime.show_progress())
}

/// Run a scan and write the report to `writer`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_writer<W: Write>(
    cli: &Cli,
    writer: W,
    show_progress: bool,
) -> anyhow::Result<ExitCode> {
    let start_time = Instant::now();

    let layered = Config::load(cli.config.as_deref()).context("Invalid configuration")?;
    let run = RunConfiguration::resolve(&layered, cli).context("Invalid configuration")?;
    log::debug!("Run configuration: {:?}", run);

    let mut finder_config = run.finder_config();
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new()));
    }
    let finder = DuplicateFinder::new(finder_config);

    let mut summary = ScanSummary::default();

    let registry = finder
        .register(&cli.paths)
        .context("Failed to register files")?;
    summary.record_registration(&registry);

    let fingerprinted = finder
        .fingerprint(registry)
        .context("Failed to fingerprint files")?;
    summary.record_fingerprint(&fingerprinted.stats);

    let mut resolver = finder.resolve(fingerprinted);
    let mut reporter = TextReporter::new(writer)
        .with_separator(run.separator)
        .with_show_size(run.show_size);
    reporter
        .report(resolver.by_ref())
        .context("Failed to resolve duplicates")?;

    summary.record_resolution(resolver.stats());
    summary.scan_duration = start_time.elapsed();
    log_summary(&summary);

    Ok(ExitCode::Success)
}

fn log_summary(summary: &ScanSummary) {
    log::info!(
        "{} files registered ({}), {} dropped by unique size, {} hashed, {} comparisons",
        summary.total_files,
        summary.total_size_display(),
        summary.eliminated_by_size,
        summary.hashed_files,
        summary.comparisons
    );
    log::info!(
        "{} duplicate groups, {} duplicate files, {} reclaimable ({:.1}%) in {:.2?}",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.wasted_percentage(),
        summary.scan_duration
    );
    if summary.mismatches > 0 {
        log::debug!(
            "{} digest matches failed full comparison",
            summary.mismatches
        );
    }
}
