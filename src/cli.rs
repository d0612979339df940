//! Command-line interface definitions for twinscan.
//!
//! This module defines all CLI arguments using the clap derive API. Every
//! option can also come from the configuration file or `TWINSCAN_`
//! environment variables; see [`crate::config`].
//!
//! # Example
//!
//! ```bash
//! # Recurse into a directory and show group sizes
//! twinscan -r -d ~/Downloads
//!
//! # Skip VCS directories and anything ending in .tmp
//! twinscan -r -i .git,.hg -e '\.tmp$' ~/src
//!
//! # Only files of at least 1 MiB, groups on one line each
//! twinscan -r -m 1MiB -s ' ' /data
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Find files with identical contents.
///
/// Files are bucketed by size, digested only where a bucket holds three or
/// more candidates, and every reported group is confirmed by a full byte
/// comparison. Nothing is modified or deleted.
#[derive(Debug, Parser)]
#[command(name = "twinscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Files and directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Match the ignore pattern case-insensitively
    #[arg(short = 'c', long)]
    pub case_insensitive: bool,

    /// Print the file size before each group
    #[arg(short = 'd', long)]
    pub display_size: bool,

    /// Skip entries whose name matches this regular expression
    #[arg(short = 'e', long = "regex-ignore-file", value_name = "REGEX")]
    pub ignore_pattern: Option<String>,

    /// Follow symbolic links
    ///
    /// Links that lead back into a directory being walked are skipped.
    #[arg(short = 'f', long = "follow-symlink")]
    pub follow_symlinks: bool,

    /// Names to skip exactly (comma-separated, can be repeated)
    #[arg(
        short = 'i',
        long = "ignore-list",
        value_name = "NAMES",
        value_delimiter = ','
    )]
    pub ignore_names: Vec<String>,

    /// Minimum file size to consider (e.g., 512, 4KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(short = 'm', long = "minimal-length", value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Trade speed for lower memory use (accepted, currently no effect)
    #[arg(short = 'o', long)]
    pub optimize_memory: bool,

    /// Prefer files under this path when ordering equal files (accepted, currently no effect)
    #[arg(short = 'p', long, value_name = "PATH")]
    pub priority_path: Option<PathBuf>,

    /// Descend into directories
    ///
    /// Without this flag, directories given as PATH contribute nothing.
    #[arg(short = 'r', long = "recurse-subdir")]
    pub recurse: bool,

    /// Character printed between the files of a group (\n, \t and \0 accepted)
    #[arg(short = 's', long, value_name = "CHAR")]
    pub separator: Option<String>,

    /// Increase verbosity level (-v shows progress and debug logs, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON objects on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use twinscan::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, an unknown size suffix, or does not fit in 64 bits.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    // Whole numbers are exact; fractions go through f64
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: '{s}'"));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;
    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let bytes = num * multiplier as f64;
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(format!("Size too large: '{s}'"));
    }
    Ok(bytes as u64)
}
