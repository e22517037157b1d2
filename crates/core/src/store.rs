//! The store contract.
//!
//! A [`KeyValueStore`] is the persistence collaborator the bridge forwards
//! to. It is object safe so hosts can hand the bridge an
//! `Arc<dyn KeyValueStore>` backed by whatever platform store they own.

use crate::entry::Entry;
use crate::error::Result;

/// Persistent mapping from string keys to string values.
///
/// Each key maps to at most one value at a time. Implementations must be
/// safe to share across threads; ordering between concurrent calls on the
/// same key is whatever the implementation's internal serialization gives.
pub trait KeyValueStore: Send + Sync {
    /// Get the value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, overwriting any prior value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key` if present.
    ///
    /// Returns `true` if the key existed. Removing an absent key is a no-op
    /// and never fails on that account.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Check if `key` exists.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Number of live entries.
    fn len(&self) -> Result<usize>;

    /// Check if the store holds no entries.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All entries, sorted by key.
    fn entries(&self) -> Result<Vec<Entry>> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                out.push(Entry { key, value });
            }
        }
        Ok(out)
    }

    /// Remove every entry.
    fn clear(&self) -> Result<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }

    /// Make all completed writes durable.
    ///
    /// Stores without a persistence layer treat this as a no-op.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
