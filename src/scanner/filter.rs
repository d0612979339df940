//! Ignore-by-name and ignore-by-pattern rules for directory entries.
//!
//! Rules apply to the final component of each entry found while listing a
//! directory. Roots given on the command line are never filtered.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};

use regex::{Regex, RegexBuilder};

/// Entry names that are always ignored so traversal can never loop back
/// into the current or parent directory.
const ALWAYS_IGNORED: [&str; 2] = [".", ".."];

/// Rules deciding whether a directory entry is skipped.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    names: HashSet<OsString>,
    pattern: Option<Regex>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            names: ALWAYS_IGNORED.iter().map(OsString::from).collect(),
            pattern: None,
        }
    }
}

impl IgnoreRules {
    /// Create rules that only ignore `.` and `..`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add exact entry names to ignore.
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Compile and set the ignore pattern.
    ///
    /// `.` matches newlines and `$` only matches at the very end of the name.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the pattern does not compile.
    pub fn with_pattern(mut self, pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .build()?;
        self.pattern = Some(regex);
        Ok(self)
    }

    /// Whether an ignore pattern is configured.
    #[must_use]
    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Number of ignored names, including `.` and `..`.
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Check whether an entry with this name must be skipped.
    #[must_use]
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        if self.names.contains(name) {
            return true;
        }
        self.pattern
            .as_ref()
            .is_some_and(|re| re.is_match(&name.to_string_lossy()))
    }
}
