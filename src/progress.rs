//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct, which implements
//! [`ProgressCallback`] to draw progress on stderr while the pipeline runs.
//! Progress is purely informational; nothing in the pipeline depends on it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for pipeline phases.
///
/// Implement this trait to receive progress updates during registration,
/// fingerprinting and resolution.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ("registering", "fingerprinting", "resolving")
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
///
/// Shows a spinner while files are registered and a bar for each of the
/// fingerprinting and resolving phases.
pub struct Progress {
    multi: MultiProgress,
    registering: Mutex<Option<ProgressBar>>,
    fingerprinting: Mutex<Option<ProgressBar>>,
    resolving: Mutex<Option<ProgressBar>>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a bar slot, recovering the data if a holder panicked.
fn slot(bar: &Mutex<Option<ProgressBar>>) -> MutexGuard<'_, Option<ProgressBar>> {
    bar.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Progress {
    /// Create a new progress reporter drawing to stderr.
    ///
    /// # Examples
    ///
    /// ```
    /// use twinscan::progress::Progress;
    ///
    /// let progress = Progress::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Create a progress reporter that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            registering: Mutex::new(None),
            fingerprinting: Mutex::new(None),
            resolving: Mutex::new(None),
        }
    }

    /// Style for the registering phase (spinner).
    fn registering_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Style for the fingerprinting and resolving phases (progress bar).
    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn active_bar(&self) -> Option<ProgressBar> {
        [&self.resolving, &self.fingerprinting, &self.registering]
            .into_iter()
            .find_map(|bar| slot(bar).clone())
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        match phase {
            "registering" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::registering_style());
                pb.set_message("Registering files");
                pb.enable_steady_tick(Duration::from_millis(100));
                *slot(&self.registering) = Some(pb);
            }
            "fingerprinting" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message("Fingerprinting");
                *slot(&self.fingerprinting) = Some(pb);
            }
            "resolving" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message("Comparing");
                *slot(&self.resolving) = Some(pb);
            }
            _ => {
                log::debug!("Unknown progress phase: {}", phase);
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if let Some(pb) = self.active_bar() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        let (bar, message) = match phase {
            "registering" => (&self.registering, "Registering complete"),
            "fingerprinting" => (&self.fingerprinting, "Fingerprinting complete"),
            "resolving" => (&self.resolving, "Comparing complete"),
            _ => return,
        };
        if let Some(pb) = slot(bar).take() {
            pb.finish_with_message(message);
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
