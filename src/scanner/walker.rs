//! Directory walker that registers candidate files.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which visits every root given
//! by the user and records each qualifying file in a [`Registry`]. It uses
//! [`walkdir`] for single-threaded traversal with entries sorted by name, so
//! registration order is deterministic.
//!
//! # Rules
//!
//! - A symbolic link is skipped unless links are followed. Links closing a
//!   loop are skipped with a warning.
//! - A directory contributes nothing unless recursion is enabled, whether it
//!   was given as a root or found while walking.
//! - Entries whose name is in the ignore set or matches the ignore pattern
//!   are not visited at all. Roots are never filtered.
//! - Regular files (or followed links to them) at least `min_size` bytes long
//!   are registered.
//! - An entry that disappears between listing and stat is skipped; any other
//!   failure aborts registration.
//!
//! # Example
//!
//! ```no_run
//! use twinscan::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig::default().with_recurse(true);
//! let registry = Walker::new(config)
//!     .register(&[PathBuf::from("/home/user/Downloads")])
//!     .unwrap();
//! println!("Registered {} files", registry.len());
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::registry::Registry;
use super::{FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Phase name reported to progress callbacks.
const PHASE: &str = "registering";

/// Directory walker for file registration.
pub struct Walker {
    /// Walker configuration
    config: WalkerConfig,
    /// Optional progress callback
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("config", &self.config)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Walker {
    /// Create a new walker.
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Register every qualifying file reachable from `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if a root cannot be queried, or if listing a
    /// directory or querying an entry fails for any reason other than the
    /// entry having vanished.
    pub fn register(&self, roots: &[PathBuf]) -> Result<Registry, ScanError> {
        let mut registry = Registry::new();

        if let Some(ref callback) = self.progress {
            callback.on_phase_start(PHASE, 0);
        }
        log::debug!("Registering files from {} root(s)", roots.len());

        for root in roots {
            self.register_root(root, &mut registry)?;
        }

        if let Some(ref callback) = self.progress {
            callback.on_phase_end(PHASE);
        }
        log::debug!(
            "Registered {} files in {} distinct sizes",
            registry.len(),
            registry.buckets.len()
        );

        Ok(registry)
    }

    /// Register one root given by the user.
    ///
    /// Roots are never checked against the ignore rules; the walk below
    /// starts filtering at depth 1.
    fn register_root(&self, root: &Path, registry: &mut Registry) -> Result<(), ScanError> {
        let mut metadata = fs::symlink_metadata(root)
            .map_err(|e| io_scan_error("stat", root.to_path_buf(), e))?;

        if metadata.file_type().is_symlink() {
            if !self.config.follow_symlinks {
                log::debug!("Skipping symlink root: {}", root.display());
                return Ok(());
            }
            metadata = fs::metadata(root)
                .map_err(|e| io_scan_error("follow link", root.to_path_buf(), e))?;
        }

        if metadata.is_dir() {
            if !self.config.recurse {
                log::info!(
                    "Skipping directory {} (recursion disabled)",
                    root.display()
                );
                return Ok(());
            }
            return self.walk_directory(root, registry);
        }

        if metadata.is_file() {
            self.consider(root.to_path_buf(), metadata.len(), registry);
        } else {
            log::debug!("Skipping special file: {}", root.display());
        }
        Ok(())
    }

    /// Walk a directory root recursively.
    fn walk_directory(&self, root: &Path, registry: &mut Registry) -> Result<(), ScanError> {
        let ignore = &self.config.ignore;
        let entries = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let ignored = ignore.is_ignored(entry.file_name());
                if ignored {
                    log::trace!("Ignoring entry: {}", entry.path().display());
                }
                !ignored
            });

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    handle_walk_error(e, "list directory")?;
                    continue;
                }
            };

            let file_type = entry.file_type();

            // Directories are descended by walkdir itself
            if file_type.is_dir() {
                continue;
            }

            // Only reported as a symlink when links are not followed
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            if !file_type.is_file() {
                log::trace!("Skipping special file: {}", entry.path().display());
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    handle_walk_error(e, "stat")?;
                    continue;
                }
            };

            self.consider(entry.into_path(), size, registry);
        }

        Ok(())
    }

    /// Register a regular file if it passes the size filter.
    fn consider(&self, path: PathBuf, size: u64, registry: &mut Registry) {
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({} bytes): {}",
                size,
                path.display()
            );
            return;
        }

        if let Some(ref callback) = self.progress {
            callback.on_progress(registry.len() + 1, path.to_string_lossy().as_ref());
        }
        log::trace!("Registered {} ({} bytes)", path.display(), size);
        registry.insert(FileRecord::new(path, size));
    }
}

/// Convert a failed filesystem query into a [`ScanError`].
fn io_scan_error(operation: &'static str, path: PathBuf, source: std::io::Error) -> ScanError {
    match source.kind() {
        ErrorKind::NotFound => ScanError::NotFound {
            operation,
            path,
            source,
        },
        ErrorKind::PermissionDenied => ScanError::PermissionDenied {
            operation,
            path,
            source,
        },
        _ => ScanError::Io {
            operation,
            path,
            source,
        },
    }
}

/// Decide whether a walkdir error aborts registration.
///
/// Vanished entries and symlink loops are skipped.
fn handle_walk_error(error: walkdir::Error, operation: &'static str) -> Result<(), ScanError> {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();

    if let Some(ancestor) = error.loop_ancestor() {
        log::warn!(
            "Skipping symlink loop: {} points back to {}",
            path.display(),
            ancestor.display()
        );
        return Ok(());
    }

    if error.io_error().map(std::io::Error::kind) == Some(ErrorKind::NotFound) {
        log::debug!("Entry vanished during scan: {}", path.display());
        return Ok(());
    }

    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("directory traversal failed"));
    Err(io_scan_error(operation, path, source))
}
