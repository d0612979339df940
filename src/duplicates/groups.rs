//! Confirmed duplicate groups.
//!
//! # Example
//!
//! ```
//! use twinscan::duplicates::DuplicateGroup;
//! use std::path::PathBuf;
//!
//! let mut group = DuplicateGroup::new(1024, PathBuf::from("/a.txt"));
//! group.push(PathBuf::from("/b.txt"));
//!
//! assert_eq!(group.len(), 2);
//! assert_eq!(group.wasted_space(), 1024);
//! ```

use std::path::PathBuf;

/// A set of files with byte-identical contents.
///
/// The first member is the anchor the others were compared against; the
/// remaining members follow in resolver order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Member paths, anchor first
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Start a group with its anchor file.
    #[must_use]
    pub fn new(size: u64, anchor: PathBuf) -> Self {
        Self {
            size,
            files: vec![anchor],
        }
    }

    /// Add a confirmed twin of the anchor.
    pub fn push(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space taken by all copies beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }
}
