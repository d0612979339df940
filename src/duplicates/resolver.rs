//! Duplicate resolver: turns fingerprinted buckets into confirmed groups.
//!
//! # Overview
//!
//! The [`Resolver`] drains the size queue left by the fingerprint phase.
//! Each distinct size is handled once, when its first file comes out of the
//! queue. For that size's bucket it:
//!
//! 1. sorts the digest slots by digest, then path
//! 2. takes each unconsumed slot in turn as an anchor and scans forward over
//!    the slots with an equal digest
//! 3. confirms every digest match with a full byte comparison; confirmed
//!    twins join the anchor's group and are marked consumed
//!
//! The scan for an anchor stops at the first differing digest. Equal digests
//! over different contents (collisions) are skipped, never grouped.
//!
//! Groups are produced lazily, one per call to `next`, so a caller can
//! report them while the rest of the buckets are still being compared.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::finder::{FinderError, Fingerprinted};
use super::groups::DuplicateGroup;
use crate::progress::ProgressCallback;
use crate::scanner::{BucketMap, DigestSlot, FileArena, Hasher, SizeQueue};

/// Phase name reported to progress callbacks.
const PHASE: &str = "resolving";

/// Tie-break between files whose digests are equal.
///
/// Holds the priority path from the configuration. The option is accepted
/// but does not change ordering yet: [`PriorityOrder::compare`] always
/// returns `Equal`, so ties fall through to plain path order.
#[derive(Debug, Clone, Default)]
pub struct PriorityOrder {
    path: Option<PathBuf>,
}

impl PriorityOrder {
    /// Create an ordering hook for an optional priority path.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// The configured priority path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Rank two files sharing a digest.
    ///
    // TODO: rank files under the priority path first once the expected
    // placement inside an already-sorted digest run is settled.
    #[must_use]
    pub fn compare(&self, _first: &Path, _second: &Path) -> Ordering {
        Ordering::Equal
    }
}

/// Counters gathered while resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Distinct sizes whose buckets were examined
    pub buckets: usize,
    /// Full-content comparisons performed
    pub comparisons: usize,
    /// Comparisons that found different contents behind equal digests
    pub mismatches: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Files in groups beyond each group's anchor
    pub duplicate_files: usize,
    /// Bytes held by those extra copies
    pub reclaimable_space: u64,
}

/// A bucket currently being scanned for groups.
#[derive(Debug)]
struct ActiveBucket {
    size: u64,
    slots: Vec<DigestSlot>,
    anchor: usize,
}

/// Lazy sequence of confirmed duplicate groups.
///
/// Yields `Err` at most once; iteration ends after an error.
pub struct Resolver {
    arena: FileArena,
    queue: SizeQueue,
    buckets: BucketMap,
    hasher: Hasher,
    priority: PriorityOrder,
    progress: Option<Arc<dyn ProgressCallback>>,
    current: Option<ActiveBucket>,
    last_size: Option<u64>,
    dequeued: usize,
    started: bool,
    finished: bool,
    stats: ResolveStats,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("queued", &self.queue.len())
            .field("buckets", &self.buckets.len())
            .field("priority", &self.priority)
            .field("finished", &self.finished)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver over the output of the fingerprint phase.
    #[must_use]
    pub fn new(fingerprinted: Fingerprinted, hasher: Hasher, priority: PriorityOrder) -> Self {
        let Fingerprinted {
            arena,
            queue,
            buckets,
            ..
        } = fingerprinted;
        Self {
            arena,
            queue,
            buckets,
            hasher,
            priority,
            progress: None,
            current: None,
            last_size: None,
            dequeued: 0,
            started: false,
            finished: false,
            stats: ResolveStats::default(),
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Counters gathered so far.
    #[must_use]
    pub fn stats(&self) -> &ResolveStats {
        &self.stats
    }

    /// Pull files from the queue until a new size comes out, then sort its
    /// bucket. Returns `false` once the queue is exhausted.
    fn open_next_bucket(&mut self) -> Result<bool, FinderError> {
        while let Some((size, id)) = self.queue.pop() {
            self.dequeued += 1;
            let record = self.arena.get(id);
            if let Some(ref callback) = self.progress {
                callback.on_progress(self.dequeued, record.path.to_string_lossy().as_ref());
            }

            // Later files of a size are handled as members of its bucket
            if self.last_size == Some(size) {
                continue;
            }
            self.last_size = Some(size);

            let bucket = self
                .buckets
                .remove(&size)
                .ok_or_else(|| FinderError::Inconsistency {
                    path: record.path.clone(),
                    size,
                })?;

            let mut slots = bucket.digests;
            self.sort_slots(&mut slots);
            self.stats.buckets += 1;
            log::trace!("Resolving {} candidates of {} bytes", slots.len(), size);

            self.current = Some(ActiveBucket {
                size,
                slots,
                anchor: 0,
            });
            return Ok(true);
        }
        Ok(false)
    }

    /// Order slots by digest, then by the priority hook, then by path bytes.
    fn sort_slots(&self, slots: &mut [DigestSlot]) {
        let arena = &self.arena;
        let priority = &self.priority;
        let path_of = |slot: &DigestSlot| slot.file.map(|id| arena.get(id).path.as_path());

        slots.sort_by(|a, b| {
            a.digest.cmp(&b.digest).then_with(|| match (path_of(a), path_of(b)) {
                (Some(pa), Some(pb)) => priority
                    .compare(pa, pb)
                    .then_with(|| pa.as_os_str().cmp(pb.as_os_str())),
                (pa, pb) => pa.cmp(&pb),
            })
        });
    }

    /// Build the group anchored at `slots[anchor]`, if it has any twins.
    fn collect_group(
        &mut self,
        slots: &mut [DigestSlot],
        anchor: usize,
        size: u64,
    ) -> Result<Option<DuplicateGroup>, FinderError> {
        let Some(anchor_id) = slots[anchor].file else {
            return Ok(None);
        };
        let anchor_digest = slots[anchor].digest;
        let anchor_path = &self.arena.get(anchor_id).path;

        let mut group: Option<DuplicateGroup> = None;
        for slot in slots.iter_mut().skip(anchor + 1) {
            // Sorted by digest: nothing past the first difference can match
            if slot.digest != anchor_digest {
                break;
            }
            let Some(candidate_id) = slot.file else {
                continue;
            };
            let candidate_path = &self.arena.get(candidate_id).path;

            self.stats.comparisons += 1;
            if self.hasher.contents_equal(anchor_path, candidate_path, size)? {
                group
                    .get_or_insert_with(|| DuplicateGroup::new(size, anchor_path.clone()))
                    .push(candidate_path.clone());
                slot.file = None;
            } else {
                self.stats.mismatches += 1;
                log::debug!(
                    "Digest {} shared by different contents: {} and {}",
                    anchor_digest,
                    anchor_path.display(),
                    candidate_path.display()
                );
            }
        }

        if let Some(ref found) = group {
            self.stats.duplicate_groups += 1;
            self.stats.duplicate_files += found.len() - 1;
            self.stats.reclaimable_space += found.wasted_space();
        }
        Ok(group)
    }

    fn fail(&mut self, error: FinderError) -> Option<Result<DuplicateGroup, FinderError>> {
        self.finished = true;
        self.current = None;
        Some(Err(error))
    }

    fn finish(&mut self) {
        self.finished = true;
        if let Some(ref callback) = self.progress {
            callback.on_phase_end(PHASE);
        }
        log::debug!(
            "Resolved {} sizes with {} comparisons into {} groups",
            self.stats.buckets,
            self.stats.comparisons,
            self.stats.duplicate_groups
        );
    }
}

impl Iterator for Resolver {
    type Item = Result<DuplicateGroup, FinderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Some(ref callback) = self.progress {
                callback.on_phase_start(PHASE, self.queue.len());
            }
        }

        loop {
            if let Some(mut active) = self.current.take() {
                while active.anchor < active.slots.len() {
                    let anchor = active.anchor;
                    active.anchor += 1;
                    match self.collect_group(&mut active.slots, anchor, active.size) {
                        Ok(Some(group)) => {
                            self.current = Some(active);
                            return Some(Ok(group));
                        }
                        Ok(None) => {}
                        Err(e) => return self.fail(e),
                    }
                }
            }

            match self.open_next_bucket() {
                Ok(true) => {}
                Ok(false) => {
                    self.finish();
                    return None;
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}
