//! Configuration for opening a store.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables, then whatever the caller (usually the CLI)
//! overrides last.
//!
//! ```toml
//! path = "./rollout-data"
//! durability = "batched"
//! batch_interval_ms = 100
//! batch_size = 1000
//! max_corrupt_records = 0
//! compaction_ratio = 0.5
//! compaction_min_bytes = 1048576
//! ```

use std::path::{Path, PathBuf};

use rollout_kv_storage::{DurabilityMode, FileStoreOptions, RecoveryOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`Config::path`].
pub const ENV_PATH: &str = "ROLLOUT_KV_PATH";
/// Environment variable overriding [`Config::durability`].
pub const ENV_DURABILITY: &str = "ROLLOUT_KV_DURABILITY";

// ============================================================================
// Config
// ============================================================================

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Store directory; `None` opens an in-memory store
    pub path: Option<PathBuf>,
    /// Durability mode name
    pub durability: DurabilityName,
    /// Batched mode: maximum time between fsyncs
    pub batch_interval_ms: u64,
    /// Batched mode: maximum writes between fsyncs
    pub batch_size: usize,
    /// Corrupt records tolerated during recovery before open fails
    pub max_corrupt_records: usize,
    /// Compact once stale bytes reach this fraction of the log
    pub compaction_ratio: f64,
    /// Never auto-compact below this many stale bytes
    pub compaction_min_bytes: u64,
}

/// Durability mode as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityName {
    /// Never fsync
    None,
    /// fsync every write
    Strict,
    /// fsync by time or count
    #[default]
    Batched,
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`Config`]
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment variable holds an unusable value
    #[error("invalid value for {var}: {reason}")]
    Env {
        /// Variable name
        var: &'static str,
        /// What was wrong
        reason: String,
    },

    /// A setting is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Default for Config {
    fn default() -> Self {
        let defaults = FileStoreOptions::default();
        let (batch_interval_ms, batch_size) = match DurabilityMode::buffered_default() {
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => (interval_ms, batch_size),
            _ => (100, 1000),
        };
        Self {
            path: None,
            durability: DurabilityName::Batched,
            batch_interval_ms,
            batch_size,
            max_corrupt_records: defaults.recovery.max_corrupt_records,
            compaction_ratio: defaults.compaction_ratio,
            compaction_min_bytes: defaults.compaction_min_bytes,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    ///
    /// A relative `path` setting is resolved against the file's directory.
    pub fn from_file(file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = file.as_ref();
        let contents = std::fs::read_to_string(file).map_err(|source| ConfigError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(path) = config.path.take() {
            config.path = Some(resolve_path(file, &path));
        }
        Ok(config)
    }

    /// Apply `ROLLOUT_KV_PATH` and `ROLLOUT_KV_DURABILITY` from the process
    /// environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_PATH).filter(|p| !p.is_empty()) {
            self.path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup(ENV_DURABILITY) {
            self.durability = name.parse().map_err(|reason| ConfigError::Env {
                var: ENV_DURABILITY,
                reason,
            })?;
        }
        Ok(())
    }

    /// Check that every setting is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.compaction_ratio > 0.0 && self.compaction_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "compaction_ratio must be in (0, 1], got {}",
                self.compaction_ratio
            )));
        }
        if self.durability == DurabilityName::Batched && self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Durability mode these settings select.
    pub fn durability_mode(&self) -> DurabilityMode {
        match self.durability {
            DurabilityName::None => DurabilityMode::None,
            DurabilityName::Strict => DurabilityMode::Strict,
            DurabilityName::Batched => DurabilityMode::Batched {
                interval_ms: self.batch_interval_ms,
                batch_size: self.batch_size,
            },
        }
    }

    /// Options for opening a file store with these settings.
    pub fn file_store_options(&self) -> FileStoreOptions {
        FileStoreOptions {
            durability: self.durability_mode(),
            recovery: RecoveryOptions {
                max_corrupt_records: self.max_corrupt_records,
            },
            compaction_ratio: self.compaction_ratio,
            compaction_min_bytes: self.compaction_min_bytes,
        }
    }
}

impl std::str::FromStr for DurabilityName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<DurabilityMode>()? {
            DurabilityMode::None => Ok(DurabilityName::None),
            DurabilityMode::Strict => Ok(DurabilityName::Strict),
            DurabilityMode::Batched { .. } => Ok(DurabilityName::Batched),
        }
    }
}

fn resolve_path(config_file: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let dir = config_file.parent().unwrap_or_else(|| Path::new("."));
    dir.join(path)
}
