//! Core types for rollout-kv
//!
//! This crate defines what every other layer agrees on:
//! - Entry: a (key, value) string pair
//! - KeyValueStore: the get/set/remove contract a persistence backend provides
//! - Error: the canonical error type for store operations
//! - Size limits enforced before a write touches any backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod limits;
pub mod store;

pub use entry::Entry;
pub use error::{Error, Result};
pub use limits::{validate_entry, validate_key, MAX_KEY_LEN, MAX_VALUE_LEN};
pub use store::KeyValueStore;
