//! Output formatting for duplicate scan results.
//!
//! # Example
//!
//! ```no_run
//! use twinscan::duplicates::DuplicateFinder;
//! use twinscan::output::TextReporter;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let registry = finder.register(&[PathBuf::from("a"), PathBuf::from("b")]).unwrap();
//! let fingerprinted = finder.fingerprint(registry).unwrap();
//!
//! let mut reporter = TextReporter::new(std::io::stdout().lock()).with_show_size(true);
//! reporter.report(finder.resolve(fingerprinted)).unwrap();
//! ```

pub mod text;

pub use text::{ReportError, TextReporter};
