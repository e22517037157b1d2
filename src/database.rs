//! Main entry point for rollout-kv.
//!
//! This module provides the `RolloutKv` struct, which owns a store and
//! hands out bridge modules forwarding to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollout_kv_bridge::RolloutStorage;
use rollout_kv_core::KeyValueStore;
use rollout_kv_storage::{
    CompactionStats, DurabilityMode, FileStore, FileStoreOptions, MemoryStore, RecoveryOptions,
    RecoveryStats,
};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;

/// An open rollout-kv store.
///
/// Create one with [`RolloutKv::open`], [`RolloutKv::ephemeral`] or
/// [`RolloutKv::builder`].
///
/// # Example
///
/// ```ignore
/// use rollout_kv::prelude::*;
///
/// let kv = RolloutKv::open("./rollout-data")?;
/// kv.set("deployment:key", "abc123")?;
///
/// // Hand the same store to the host runtime
/// let storage = kv.bridge()?;
/// storage.set_item("rollout:percent", "25");
///
/// kv.close()?;
/// ```
pub struct RolloutKv {
    store: Arc<dyn KeyValueStore>,
    /// Set when disk-backed
    file: Option<Arc<FileStore>>,
}

impl RolloutKv {
    /// Open a store in directory `path` with default settings
    /// (batched durability, strict recovery).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an in-memory store with no disk I/O.
    ///
    /// Data is lost when the last handle is dropped.
    pub fn ephemeral() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            file: None,
        }
    }

    /// Create a builder for store configuration.
    pub fn builder() -> RolloutKvBuilder {
        RolloutKvBuilder::new()
    }

    /// Open a store from loaded configuration.
    ///
    /// Validates the configuration first. Without a `path` the store is
    /// in-memory.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let builder = RolloutKvBuilder {
            path: config.path.clone(),
            options: config.file_store_options(),
        };
        builder.open()
    }

    // =========================================================================
    // Store operations
    // =========================================================================

    /// Write `value` under `key`.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).map_err(Into::into)
    }

    /// Read the value under `key`, `None` if absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).map_err(Into::into)
    }

    /// Delete `key`. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.store.remove(key).map_err(Into::into)
    }

    /// Check if `key` is present.
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.store.contains(key).map_err(Into::into)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.keys().map_err(Into::into)
    }

    /// Number of keys.
    pub fn len(&self) -> Result<usize> {
        self.store.len().map_err(Into::into)
    }

    /// Check if the store has no keys.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty().map_err(Into::into)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Force pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.flush().map_err(Into::into)
    }

    /// Rewrite the log to hold only live entries.
    ///
    /// In-memory stores have nothing to compact and report zeroed stats.
    pub fn compact(&self) -> Result<CompactionStats> {
        match &self.file {
            Some(file) => file.compact().map_err(Into::into),
            None => Ok(CompactionStats::default()),
        }
    }

    /// Flush and release the log.
    ///
    /// Every later operation on this store, including calls arriving
    /// through bridge modules, fails as closed.
    pub fn close(&self) -> Result<()> {
        match &self.file {
            Some(file) => file.close().map_err(Into::into),
            None => Ok(()),
        }
    }

    /// Store directory, `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref().map(FileStore::path)
    }

    /// Durability mode in effect.
    pub fn durability_mode(&self) -> DurabilityMode {
        match &self.file {
            Some(file) => file.durability_mode(),
            None => DurabilityMode::None,
        }
    }

    /// Check if this is an in-memory store.
    pub fn is_ephemeral(&self) -> bool {
        self.file.is_none()
    }

    /// What recovery found on open, `None` for an in-memory store.
    pub fn recovery_stats(&self) -> Option<&RecoveryStats> {
        self.file.as_deref().map(FileStore::recovery_stats)
    }

    /// The shared store.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Start a bridge module forwarding to this store.
    ///
    /// Each call starts a separate module with its own worker; calls are
    /// ordered within one module, not across modules.
    pub fn bridge(&self) -> Result<RolloutStorage> {
        RolloutStorage::new(self.store()).map_err(Into::into)
    }
}

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Disk-backed, fsync on every write
/// let kv = RolloutKv::builder()
///     .path("./rollout-data")
///     .strict()
///     .open()?;
///
/// // Salvage what can be read from a damaged log
/// let kv = RolloutKv::builder()
///     .path("./rollout-data")
///     .max_corrupt_records(usize::MAX)
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RolloutKvBuilder {
    path: Option<PathBuf>,
    options: FileStoreOptions,
}

impl RolloutKvBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the durability mode.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.options.durability = mode;
        self
    }

    /// fsync every write.
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// fsync every 100ms or 1000 writes (default).
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::buffered_default())
    }

    /// fsync every `interval_ms` or `batch_size` writes.
    pub fn buffered_with(self, interval_ms: u64, batch_size: usize) -> Self {
        self.durability(DurabilityMode::Batched {
            interval_ms,
            batch_size,
        })
    }

    /// Never fsync. Files are still written.
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// Corrupt records recovery may skip before the open fails.
    pub fn max_corrupt_records(mut self, max: usize) -> Self {
        self.options.recovery = RecoveryOptions {
            max_corrupt_records: max,
        };
        self
    }

    /// Compact once stale bytes reach this fraction of the log.
    pub fn compaction_ratio(mut self, ratio: f64) -> Self {
        self.options.compaction_ratio = ratio;
        self
    }

    /// Never auto-compact below this many stale bytes.
    pub fn compaction_min_bytes(mut self, bytes: u64) -> Self {
        self.options.compaction_min_bytes = bytes;
        self
    }

    /// Open the store.
    ///
    /// Without a path this opens an in-memory store.
    pub fn open(self) -> Result<RolloutKv> {
        let Some(path) = self.path else {
            return Ok(RolloutKv::ephemeral());
        };
        let file = Arc::new(FileStore::open(&path, self.options)?);
        debug!(path = %path.display(), mode = %file.durability_mode(), "Opened rollout-kv");
        Ok(RolloutKv {
            store: file.clone(),
            file: Some(file),
        })
    }

    /// Open an in-memory store, ignoring path and durability settings.
    pub fn ephemeral(self) -> RolloutKv {
        RolloutKv::ephemeral()
    }
}
