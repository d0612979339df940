//! Scanner module for file registration and content fingerprinting.
//!
//! This module provides functionality for:
//! - Directory traversal with name and pattern filtering
//! - Size bucketing of every qualifying file
//! - Content digests over memory-mapped file contents
//! - Exact byte comparison of two candidate files
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file registration
//! - [`filter`]: Ignore-by-name and ignore-by-pattern rules
//! - [`registry`]: The file arena, the size-ordered queue and the bucket map
//! - [`hasher`]: 256-bit content digests and exact comparison
//!
//! # Example
//!
//! ```no_run
//! use twinscan::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     recurse: true,
//!     ..Default::default()
//! };
//!
//! let registry = Walker::new(config).register(&[PathBuf::from(".")]).unwrap();
//! println!("{} files registered", registry.len());
//! ```

pub mod filter;
pub mod hasher;
pub mod registry;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use filter::IgnoreRules;
pub use hasher::{ContentDigest, Digest, DigestValue, Hasher, JenkinsDigest, HASH_WORDS};
pub use registry::{BucketMap, DigestSlot, FileArena, FileId, Registry, SizeBucket, SizeQueue};
pub use walker::Walker;

/// A file registered for duplicate detection.
///
/// Created once per qualifying file during traversal and never changed
/// afterwards. Records live in the [`FileArena`] for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path of the file as it was reached from its root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
///
/// Controls filtering, symlink handling and recursion.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Links that close a loop are skipped with a warning.
    pub follow_symlinks: bool,

    /// Descend into directories.
    /// Without it, directories (including the roots) contribute nothing.
    pub recurse: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: u64,

    /// Names and pattern that exclude an entry from traversal.
    pub ignore: IgnoreRules,
}

impl WalkerConfig {
    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether subdirectories are traversed.
    #[must_use]
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the ignore rules.
    #[must_use]
    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }
}

/// Errors that can occur while registering files.
///
/// Any of these aborts the run; an entry vanishing between listing and
/// stat is not an error and never reaches this type.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied during {operation}: {path}")]
    PermissionDenied {
        /// The filesystem operation that failed
        operation: &'static str,
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A root path given on the command line does not exist.
    #[error("Path not found during {operation}: {path}")]
    NotFound {
        /// The filesystem operation that failed
        operation: &'static str,
        /// Path that was not found
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A metadata query or directory listing failed.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The filesystem operation that failed
        operation: &'static str,
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while reading file contents.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file could not be opened.
    #[error("Unable to open {path}: {source}")]
    Open {
        /// Path of the file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be mapped into memory.
    #[error("Unable to map {path}: {source}")]
    Map {
        /// Path of the file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file no longer has the size it was registered with.
    #[error("{path} changed size during the scan (expected {expected} bytes, found {actual})")]
    SizeChanged {
        /// Path of the file
        path: PathBuf,
        /// Size recorded at registration
        expected: u64,
        /// Size found when mapping
        actual: u64,
    },
}
