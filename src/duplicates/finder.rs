//! Duplicate finder implementation with a three-phase pipeline.
//!
//! # Overview
//!
//! This module orchestrates duplicate detection:
//! 1. **Register** - walk the roots into a [`Registry`] (see [`crate::scanner::Walker`])
//! 2. **Fingerprint** - drop sizes held by a single file and digest the rest
//! 3. **Resolve** - confirm digest matches byte by byte (see [`Resolver`])
//!
//! # Example
//!
//! ```no_run
//! use twinscan::duplicates::{DuplicateFinder, FinderConfig};
//! use twinscan::scanner::WalkerConfig;
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_walker_config(WalkerConfig::default().with_recurse(true));
//! let finder = DuplicateFinder::new(config);
//!
//! let registry = finder.register(&[PathBuf::from(".")]).unwrap();
//! let fingerprinted = finder.fingerprint(registry).unwrap();
//! for group in finder.resolve(fingerprinted) {
//!     println!("{:?}", group.unwrap().files);
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::DuplicateGroup;
use super::resolver::{PriorityOrder, ResolveStats, Resolver};
use crate::progress::ProgressCallback;
use crate::scanner::{
    BucketMap, Digest, FileArena, HashError, Hasher, Registry, ScanError, SizeQueue, Walker,
    WalkerConfig,
};

/// Phase name reported to progress callbacks.
const PHASE: &str = "fingerprinting";

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// Registration failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be read for digesting or comparison.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A queued file has no bucket for its size.
    #[error("Internal inconsistency: no size bucket for {path} ({size} bytes)")]
    Inconsistency {
        /// File that was dequeued
        path: PathBuf,
        /// Its recorded size
        size: u64,
    },
}

/// Statistics from the fingerprint phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintStats {
    /// Files that entered the phase
    pub input_files: usize,
    /// Files discarded because no other file has their size
    pub unique_sizes: usize,
    /// Files whose content was digested
    pub hashed_files: usize,
    /// Files kept with the unhashed marker
    pub unhashed_files: usize,
}

impl FingerprintStats {
    /// Files still in the running after this phase.
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.hashed_files + self.unhashed_files
    }
}

/// Output of the fingerprint phase.
///
/// The queue holds only files that share their size with another file, and
/// each of their buckets has one digest slot per such file.
#[derive(Debug, Default)]
pub struct Fingerprinted {
    /// Every registered file
    pub arena: FileArena,
    /// Surviving files ordered by size
    pub queue: SizeQueue,
    /// Buckets of the surviving sizes
    pub buckets: BucketMap,
    /// Phase counters
    pub stats: FingerprintStats,
}

/// Drain the registry queue into a fresh queue of duplicate candidates.
///
/// For each dequeued file:
/// - a bucket of one file is removed and the file discarded
/// - buckets of two files, and buckets of empty files, get the unhashed marker
/// - every other file is digested over its whole content
///
/// # Errors
///
/// Returns [`FinderError::Inconsistency`] if a file's size has no bucket, or
/// [`FinderError::Hash`] if a file cannot be read.
pub fn fingerprint(
    registry: Registry,
    hasher: &Hasher,
    progress: Option<&dyn ProgressCallback>,
) -> Result<Fingerprinted, FinderError> {
    let Registry {
        arena,
        mut queue,
        mut buckets,
    } = registry;

    let mut next = SizeQueue::new();
    let mut stats = FingerprintStats {
        input_files: queue.len(),
        ..FingerprintStats::default()
    };

    if let Some(callback) = progress {
        callback.on_phase_start(PHASE, stats.input_files);
    }

    let mut processed = 0;
    while let Some((size, id)) = queue.pop() {
        processed += 1;
        let record = arena.get(id);
        if let Some(callback) = progress {
            callback.on_progress(processed, record.path.to_string_lossy().as_ref());
        }

        let bucket = buckets
            .get_mut(&size)
            .ok_or_else(|| FinderError::Inconsistency {
                path: record.path.clone(),
                size,
            })?;

        if bucket.file_count == 1 {
            buckets.remove(&size);
            stats.unique_sizes += 1;
            log::trace!("Unique size {} for {}", size, record.path.display());
            continue;
        }

        let digest = if bucket.skips_hashing() {
            stats.unhashed_files += 1;
            Digest::Unhashed
        } else {
            stats.hashed_files += 1;
            Digest::Hashed(hasher.hash_file(&record.path, size)?)
        };
        bucket.push_digest(digest, id);
        next.push(size, id);
    }

    if let Some(callback) = progress {
        callback.on_phase_end(PHASE);
    }

    Ok(Fingerprinted {
        arena,
        queue: next,
        buckets,
        stats,
    })
}

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Walker configuration for registration.
    pub walker_config: WalkerConfig,
    /// Reads and digests file contents.
    pub hasher: Hasher,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Preferred location among equal files. Accepted, does not yet affect order.
    pub priority_path: Option<PathBuf>,
    /// Reduce memory use. Accepted, no effect.
    pub optimize_memory: bool,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("hasher", &self.hasher)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("priority_path", &self.priority_path)
            .field("optimize_memory", &self.optimize_memory)
            .finish()
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the priority path.
    #[must_use]
    pub fn with_priority_path(mut self, path: Option<PathBuf>) -> Self {
        self.priority_path = path;
        self
    }

    /// Set the memory optimization hint.
    #[must_use]
    pub fn with_optimize_memory(mut self, enabled: bool) -> Self {
        self.optimize_memory = enabled;
        self
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files registered
    pub total_files: usize,
    /// Total size of all registered files in bytes
    pub total_size: u64,
    /// Files eliminated because their size is unique
    pub eliminated_by_size: usize,
    /// Files digested during fingerprinting
    pub hashed_files: usize,
    /// Full-content comparisons performed
    pub comparisons: usize,
    /// Comparisons that found equal digests over different contents
    pub mismatches: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding each group's first)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Take the registration totals.
    pub fn record_registration(&mut self, registry: &Registry) {
        self.total_files = registry.len();
        self.total_size = registry.total_size();
    }

    /// Take the fingerprint phase counters.
    pub fn record_fingerprint(&mut self, stats: &FingerprintStats) {
        self.eliminated_by_size = stats.unique_sizes;
        self.hashed_files = stats.hashed_files;
    }

    /// Take the resolver counters.
    pub fn record_resolution(&mut self, stats: &ResolveStats) {
        self.comparisons = stats.comparisons;
        self.mismatches = stats.mismatches;
        self.duplicate_groups = stats.duplicate_groups;
        self.duplicate_files = stats.duplicate_files;
        self.reclaimable_space = stats.reclaimable_space;
    }

    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Duplicate finder that runs the register, fingerprint and resolve phases.
///
/// The phases can be driven one at a time, which lets a caller report groups
/// as the resolver yields them, or all at once with
/// [`DuplicateFinder::find_duplicates`].
///
/// # Example
///
/// ```no_run
/// use twinscan::duplicates::DuplicateFinder;
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(&[PathBuf::from("a.txt"), PathBuf::from("b.txt")]) {
///     Ok((groups, summary)) => {
///         println!("Found {} duplicate groups", groups.len());
///         println!("Can reclaim {}", summary.reclaimable_display());
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        if config.optimize_memory {
            log::debug!("Memory optimization requested; no alternate strategy is available");
        }
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Phase 1: register every qualifying file under the roots.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Scan`] if a root or directory cannot be read.
    pub fn register(&self, roots: &[PathBuf]) -> Result<Registry, FinderError> {
        let mut walker = Walker::new(self.config.walker_config.clone());
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let registry = walker.register(roots)?;
        log::info!(
            "Registered {} files ({})",
            registry.len(),
            ByteSize::b(registry.total_size())
        );
        Ok(registry)
    }

    /// Phase 2: discard unique sizes and digest the remaining candidates.
    ///
    /// # Errors
    ///
    /// See [`fingerprint`].
    pub fn fingerprint(&self, registry: Registry) -> Result<Fingerprinted, FinderError> {
        let fingerprinted = fingerprint(
            registry,
            &self.config.hasher,
            self.config.progress_callback.as_deref(),
        )?;
        let stats = &fingerprinted.stats;
        log::info!(
            "Fingerprinting complete: {} → {} candidates ({} hashed)",
            stats.input_files,
            stats.candidates(),
            stats.hashed_files
        );
        Ok(fingerprinted)
    }

    /// Phase 3: a lazy sequence of confirmed groups.
    #[must_use]
    pub fn resolve(&self, fingerprinted: Fingerprinted) -> Resolver {
        let resolver = Resolver::new(
            fingerprinted,
            self.config.hasher.clone(),
            PriorityOrder::new(self.config.priority_path.clone()),
        );
        match self.config.progress_callback {
            Some(ref callback) => resolver.with_progress_callback(callback.clone()),
            None => resolver,
        }
    }

    /// Run every phase and collect the groups.
    ///
    /// # Returns
    ///
    /// A tuple of:
    /// - `Vec<DuplicateGroup>` - confirmed groups in resolver order
    /// - `ScanSummary` - statistics about the scan
    ///
    /// # Errors
    ///
    /// Returns the first error from any phase.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let registry = self.register(roots)?;
        summary.record_registration(&registry);

        let fingerprinted = self.fingerprint(registry)?;
        summary.record_fingerprint(&fingerprinted.stats);

        let mut resolver = self.resolve(fingerprinted);
        let groups = resolver.by_ref().collect::<Result<Vec<_>, _>>()?;
        summary.record_resolution(resolver.stats());
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} reclaimable",
            summary.duplicate_groups,
            summary.reclaimable_display()
        );
        Ok((groups, summary))
    }
}
