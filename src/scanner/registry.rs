//! File arena, size-ordered queue and size-bucket map.
//!
//! # Overview
//!
//! Registration produces a [`Registry`]:
//! - a [`FileArena`] owning every [`FileRecord`] for the whole run
//! - a [`SizeQueue`] handing out file ids in non-decreasing size order, so
//!   files of the same size come out contiguously
//! - a [`BucketMap`] from exact size (full 64 bits) to [`SizeBucket`]
//!
//! The fingerprint phase drains the queue and builds a new one; queues are
//! never filtered in place.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::hasher::Digest;
use super::FileRecord;

/// Index of a record in the [`FileArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(usize);

impl FileId {
    /// Position of the record in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owner of every [`FileRecord`] registered during a run.
///
/// Records are only ever appended; ids stay valid until the arena is dropped.
#[derive(Debug, Default)]
pub struct FileArena {
    records: Vec<FileRecord>,
}

impl FileArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return its id.
    pub fn alloc(&mut self, record: FileRecord) -> FileId {
        let id = FileId(self.records.len());
        self.records.push(record);
        id
    }

    /// Look up a record.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    #[must_use]
    pub fn get(&self, id: FileId) -> &FileRecord {
        &self.records[id.0]
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }
}

/// Priority queue of files, smallest size first.
///
/// Files of equal size come out in the order they were pushed.
#[derive(Debug, Default)]
pub struct SizeQueue {
    heap: BinaryHeap<Reverse<(u64, FileId)>>,
}

impl SizeQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file keyed by its size.
    pub fn push(&mut self, size: u64, id: FileId) {
        self.heap.push(Reverse((size, id)));
    }

    /// Remove the file with the smallest size.
    pub fn pop(&mut self) -> Option<(u64, FileId)> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    /// Number of queued files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// A digest paired with the file it was computed for.
///
/// `file` becomes `None` once the file has been reported in a group; a
/// consumed slot can neither anchor nor join another group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestSlot {
    /// Fingerprint of the file content
    pub digest: Digest,
    /// The file, or `None` once consumed
    pub file: Option<FileId>,
}

impl DigestSlot {
    /// Whether the file was already reported.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.file.is_none()
    }
}

/// All registered files sharing one exact size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes
    pub size: u64,
    /// Number of registered files with this size
    pub file_count: u32,
    /// Number of digest slots filled so far
    pub fingerprinted_count: u32,
    /// One slot per file; empty until the fingerprint phase reaches this size
    pub digests: Vec<DigestSlot>,
}

impl SizeBucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            file_count: 0,
            fingerprinted_count: 0,
            digests: Vec::new(),
        }
    }

    /// Whether hashing can be skipped for this bucket.
    ///
    /// Two candidates cost one comparison either way, and empty files are
    /// equal by definition.
    #[must_use]
    pub fn skips_hashing(&self) -> bool {
        self.file_count == 2 || self.size == 0
    }

    /// Append a digest slot, reserving `file_count` slots on first use.
    pub fn push_digest(&mut self, digest: Digest, file: FileId) {
        if self.digests.capacity() == 0 {
            self.digests.reserve_exact(self.file_count as usize);
        }
        debug_assert!(self.fingerprinted_count < self.file_count);
        self.digests.push(DigestSlot {
            digest,
            file: Some(file),
        });
        self.fingerprinted_count += 1;
    }
}

/// Buckets keyed by exact file size.
pub type BucketMap = HashMap<u64, SizeBucket>;

/// Output of the registration phase.
#[derive(Debug, Default)]
pub struct Registry {
    /// Every registered file
    pub arena: FileArena,
    /// Registered files ordered by size
    pub queue: SizeQueue,
    /// One bucket per distinct size
    pub buckets: BucketMap,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a qualifying file.
    ///
    /// Stores it in the arena, queues it by size and counts it in the bucket
    /// for its size, creating the bucket if needed.
    pub fn insert(&mut self, record: FileRecord) -> FileId {
        let size = record.size;
        let id = self.arena.alloc(record);
        self.queue.push(size, id);
        self.buckets
            .entry(size)
            .or_insert_with(|| SizeBucket::new(size))
            .file_count += 1;
        id
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether no file was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Total bytes across all registered files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.arena.iter().map(|r| r.size).sum()
    }
}
