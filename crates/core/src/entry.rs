//! The unit of storage: a (key, value) string pair.

use serde::{Deserialize, Serialize};

/// A single key-value pair.
///
/// Keys are unique within a store. Any UTF-8 string, including the empty
/// string, is a valid key or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Entry key
    pub key: String,
    /// Entry value
    pub value: String,
}

impl Entry {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Encoded size of key and value in bytes.
    pub fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

impl From<(String, String)> for Entry {
    fn from((key, value): (String, String)) -> Self {
        Self { key, value }
    }
}
