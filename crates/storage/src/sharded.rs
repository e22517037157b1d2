//! Sharded in-memory store
//!
//! DashMap keyed directly by the entry key, hashed with FxHash.
//! Lock-free reads, sharded writes, O(1) lookups. Nothing touches disk.
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, lock-free reads
//! - FxHash: fast non-crypto hash for short string keys
//! - No persistence: used for tests, ephemeral hosts, and as the reference
//!   model the file store is checked against

use std::hash::BuildHasherDefault;

use dashmap::DashMap;
use rollout_kv_core::{validate_entry, KeyValueStore, Result};
use rustc_hash::FxHasher;
use tracing::trace;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// In-memory key-value store.
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): Lock-free read via DashMap
/// - set()/remove(): Only locks the key's shard
///
/// # Example
///
/// ```ignore
/// use rollout_kv_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.set("rollout:percent", "25")?;
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    data: DashMap<String, String, FxBuildHasher>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            data: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Create with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: DashMap::with_capacity_and_hasher(capacity, FxBuildHasher::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "MemoryStore get");
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_entry(key, value)?;
        trace!(key, "MemoryStore set");
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<bool> {
        trace!(key, "MemoryStore remove");
        Ok(self.data.remove(key).is_some())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }

    fn clear(&self) -> Result<()> {
        self.data.clear();
        Ok(())
    }
}
