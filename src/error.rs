//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;
use crate::duplicates::FinderError;
use crate::output::ReportError;

/// Exit codes for the twinscan binary.
///
/// - 0: Success (with or without duplicates)
/// - 1: General error (traversal or I/O failure)
/// - 2: Configuration or usage error
/// - 3: Internal consistency error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the scan completed.
    Success = 0,
    /// General error: registration, reading or writing failed.
    GeneralError = 1,
    /// Configuration error: bad option, file or pattern.
    ConfigError = 2,
    /// Internal error: a pipeline invariant was violated.
    InternalError = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TS000",
            Self::GeneralError => "TS001",
            Self::ConfigError => "TS002",
            Self::InternalError => "TS003",
        }
    }

    /// Short category name used in JSON output.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::GeneralError => "io",
            Self::ConfigError => "config",
            Self::InternalError => "internal",
        }
    }

    /// Pick the exit code for an error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.is::<ConfigError>() {
                return Self::ConfigError;
            }
            let finder = cause.downcast_ref::<FinderError>().or_else(|| {
                match cause.downcast_ref::<ReportError>() {
                    Some(ReportError::Finder(inner)) => Some(inner),
                    _ => None,
                }
            });
            if let Some(FinderError::Inconsistency { .. }) = finder {
                return Self::InternalError;
            }
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Error category ("io", "config", "internal")
    pub kind: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            kind: exit_code.kind().to_string(),
        }
    }
}
