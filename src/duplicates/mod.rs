//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Discarding unique sizes and digesting candidates (fingerprinting)
//! - Confirming digest matches by full comparison (resolving)
//! - Duplicate group management

pub mod finder;
pub mod groups;
pub mod resolver;

pub use finder::{
    fingerprint, DuplicateFinder, FinderConfig, FinderError, FingerprintStats, Fingerprinted,
    ScanSummary,
};
pub use groups::DuplicateGroup;
pub use resolver::{PriorityOrder, ResolveStats, Resolver};
