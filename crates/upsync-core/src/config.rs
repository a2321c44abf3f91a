//! Configuration module for upsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for upsync.
///
/// Every section is optional in the YAML file; missing sections and fields
/// take their defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sync: SyncConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Merge policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Remote-only files with more storage blocks than this are skipped.
    pub max_blocks: u64,
    /// Permission bits for files written by a pull.
    pub file_mode: u32,
    /// Permission bits for directories created locally.
    pub dir_mode: u32,
}

/// Directory-backed remote store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding one subtree per user. A leading `~` is expanded.
    pub root: PathBuf,
    /// Size of one storage block in bytes.
    pub block_size: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` if a file exists there.
    ///
    /// Returns `Ok(None)` when there is no file. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load_if_present(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/upsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("upsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default block threshold for automatic pulls.
pub const DEFAULT_MAX_BLOCKS: u64 = 50;

/// Default store block size (1 MiB).
pub const DEFAULT_BLOCK_SIZE: u64 = 1024 * 1024;

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
            file_mode: 0o600,
            dir_mode: 0o700,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/.local/share/upsync/store"),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// The store root with a leading `~` replaced by the home directory.
    pub fn resolved_root(&self) -> PathBuf {
        expand_home(&self.root)
    }
}

/// Replace a leading `~` component with the user's home directory.
///
/// Paths without a leading `~`, or with no known home directory, are
/// returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.max_blocks"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.max_blocks == 0 {
            errors.push(ValidationError {
                field: "sync.max_blocks".into(),
                message: "must be greater than 0".into(),
            });
        }
        // Pulled files are pushed back later, so the owner must keep read/write.
        if self.sync.file_mode > 0o7777 || self.sync.file_mode & 0o600 != 0o600 {
            errors.push(ValidationError {
                field: "sync.file_mode".into(),
                message: format!(
                    "must be at most 0o7777 and include owner read/write (got {:#o})",
                    self.sync.file_mode
                ),
            });
        }
        if self.sync.dir_mode > 0o7777 || self.sync.dir_mode & 0o700 != 0o700 {
            errors.push(ValidationError {
                field: "sync.dir_mode".into(),
                message: format!(
                    "must be at most 0o7777 and include owner rwx (got {:#o})",
                    self.sync.dir_mode
                ),
            });
        }

        // --- store ---
        if self.store.block_size == 0 {
            errors.push(ValidationError {
                field: "store.block_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.store.root.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "store.root".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use upsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .store_root(PathBuf::from("/srv/upsync"))
///     .sync_max_blocks(100)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_max_blocks(mut self, blocks: u64) -> Self {
        self.config.sync.max_blocks = blocks;
        self
    }

    pub fn sync_file_mode(mut self, mode: u32) -> Self {
        self.config.sync.file_mode = mode;
        self
    }

    pub fn sync_dir_mode(mut self, mode: u32) -> Self {
        self.config.sync.dir_mode = mode;
        self
    }

    // --- store ---

    pub fn store_root(mut self, root: PathBuf) -> Self {
        self.config.store.root = root;
        self
    }

    pub fn store_block_size(mut self, bytes: u64) -> Self {
        self.config.store.block_size = bytes;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
