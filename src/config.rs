//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a TOML file: `--config <PATH>`, or `config.toml` in the platform
//!    config directory when it exists
//! 3. `TWINSCAN_`-prefixed environment variables (`TWINSCAN_MIN_SIZE=4KiB`)
//! 4. command-line flags
//!
//! The merged [`Config`] is then validated into an immutable
//! [`RunConfiguration`] before any traversal starts.
//!
//! # Example file
//!
//! ```toml
//! recurse = true
//! min_size = "1KiB"
//! ignore_names = [".git", "node_modules"]
//! ignore_pattern = '\.(tmp|swp)$'
//! separator = "\\t"
//! show_size = true
//! ```

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{parse_size, Cli};
use crate::duplicates::FinderConfig;
use crate::scanner::{IgnoreRules, WalkerConfig};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TWINSCAN_";

/// Errors in the configuration, reported before any traversal begins.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The ignore pattern does not compile.
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as given
        pattern: String,
        /// Compiler diagnostic
        #[source]
        source: regex::Error,
    },

    /// A size setting could not be parsed.
    #[error("Invalid minimum size '{value}': {reason}")]
    InvalidSize {
        /// Setting as given
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// The separator is not a single character or known escape.
    #[error("Invalid separator '{0}': expected one character or one of \\n, \\t, \\0")]
    InvalidSeparator(String),

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    MissingFile(PathBuf),

    /// A layer could not be read or has the wrong shape.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

/// A size given either as a byte count or as text with a unit suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSetting {
    /// Plain byte count (`min_size = 4096`)
    Bytes(u64),
    /// Human-readable size (`min_size = "4KiB"`)
    Text(String),
}

impl SizeSetting {
    /// Resolve to a byte count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSize`] if the text form does not parse.
    pub fn to_bytes(&self) -> Result<u64, ConfigError> {
        match self {
            Self::Bytes(bytes) => Ok(*bytes),
            Self::Text(text) => parse_size(text).map_err(|reason| ConfigError::InvalidSize {
                value: text.clone(),
                reason,
            }),
        }
    }
}

/// Layered settings as read from defaults, file and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum file size to consider.
    pub min_size: Option<SizeSetting>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Descend into directories.
    pub recurse: bool,
    /// Match the ignore pattern case-insensitively.
    pub case_insensitive: bool,
    /// Exact entry names to skip.
    pub ignore_names: Vec<String>,
    /// Regular expression for entry names to skip.
    pub ignore_pattern: Option<String>,
    /// Character between the files of a group.
    pub separator: Option<String>,
    /// Print the size before each group.
    pub show_size: bool,
    /// Preferred location among equal files.
    pub priority_path: Option<PathBuf>,
    /// Lower memory use hint.
    pub optimize_memory: bool,
}

impl Config {
    /// Build the layered figment without the CLI layer.
    ///
    /// An explicit `config_file` must exist; the platform default file is
    /// only merged when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] for an explicit path that does
    /// not exist.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                log::debug!("Loading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Loading configuration from {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load defaults, file and environment layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or malformed, or a
    /// value has the wrong type.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(config_file)?.extract()?)
    }

    /// Platform-specific default configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "twinscan", "twinscan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the layered settings.
    ///
    /// Boolean flags only switch options on. Valued options replace the
    /// layered value, except ignore names, which are added.
    #[must_use]
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        self.follow_symlinks |= cli.follow_symlinks;
        self.recurse |= cli.recurse;
        self.case_insensitive |= cli.case_insensitive;
        self.show_size |= cli.display_size;
        self.optimize_memory |= cli.optimize_memory;

        if let Some(bytes) = cli.min_size {
            self.min_size = Some(SizeSetting::Bytes(bytes));
        }
        if let Some(ref pattern) = cli.ignore_pattern {
            self.ignore_pattern = Some(pattern.clone());
        }
        if let Some(ref separator) = cli.separator {
            self.separator = Some(separator.clone());
        }
        if let Some(ref path) = cli.priority_path {
            self.priority_path = Some(path.clone());
        }
        self.ignore_names.extend(cli.ignore_names.iter().cloned());
        self
    }
}

/// Parse a separator setting into a single character.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSeparator`] for anything other than one
/// character or the escapes `\n`, `\t` and `\0`.
pub fn parse_separator(value: &str) -> Result<char, ConfigError> {
    match value {
        "\\n" => return Ok('\n'),
        "\\t" => return Ok('\t'),
        "\\0" => return Ok('\0'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidSeparator(value.to_string())),
    }
}

/// Validated options for one run. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Descend into directories
    pub recurse: bool,
    /// Case-insensitive ignore pattern
    pub case_insensitive: bool,
    /// Compiled ignore names and pattern
    pub ignore: IgnoreRules,
    /// Character between the files of a group
    pub separator: char,
    /// Print the size before each group
    pub show_size: bool,
    /// Preferred location among equal files (no effect on ordering yet)
    pub priority_path: Option<PathBuf>,
    /// Lower memory use hint (no effect)
    pub optimize_memory: bool,
}

impl RunConfiguration {
    /// Validate layered settings and CLI flags into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed size, separator or pattern.
    pub fn resolve(config: &Config, cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_config(&config.clone().merge_cli(cli))
    }

    /// Validate already-merged settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a malformed size, separator or pattern.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let min_size = match config.min_size {
            Some(ref size) => size.to_bytes()?,
            None => 0,
        };

        let separator = match config.separator {
            Some(ref value) => parse_separator(value)?,
            None => '\n',
        };

        let mut ignore = IgnoreRules::new().with_names(config.ignore_names.iter().cloned());
        if let Some(ref pattern) = config.ignore_pattern {
            ignore = ignore
                .with_pattern(pattern, config.case_insensitive)
                .map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }

        Ok(Self {
            min_size,
            follow_symlinks: config.follow_symlinks,
            recurse: config.recurse,
            case_insensitive: config.case_insensitive,
            ignore,
            separator,
            show_size: config.show_size,
            priority_path: config.priority_path.clone(),
            optimize_memory: config.optimize_memory,
        })
    }

    /// Registration settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_follow_symlinks(self.follow_symlinks)
            .with_recurse(self.recurse)
            .with_min_size(self.min_size)
            .with_ignore(self.ignore.clone())
    }

    /// Pipeline settings, without a progress callback.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_walker_config(self.walker_config())
            .with_priority_path(self.priority_path.clone())
            .with_optimize_memory(self.optimize_memory)
    }
}
