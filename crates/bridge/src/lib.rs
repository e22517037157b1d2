//! RolloutStorage bridge module
//!
//! Exposes a persistent string store to a host application runtime through
//! three operations:
//!
//! - `setItem(key, value)`: fire-and-forget write
//! - `getItem(key)`: asynchronous read, resolves to the value or absence
//! - `removeItem(key)`: fire-and-forget delete, no-op if absent
//!
//! Hosts call either the typed API on [`RolloutStorage`] or the dispatch
//! table ([`RolloutStorage::invoke`]) by method name with JSON arguments.
//! [`descriptor()`] lists what the module exports.
//!
//! # Example
//!
//! ```ignore
//! use rollout_kv_bridge::RolloutStorage;
//! use rollout_kv_storage::MemoryStore;
//!
//! let storage = RolloutStorage::new(Arc::new(MemoryStore::new()))?;
//! storage.set_item("rollout:percent", "25");
//! assert_eq!(storage.get_item("rollout:percent").await?, Some("25".into()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod descriptor;
mod dispatch;
mod error;
mod module;
mod worker;

pub use descriptor::{descriptor, Method, MethodSpec, ModuleDescriptor, ReturnKind, METHODS, MODULE_NAME};
pub use dispatch::Invocation;
pub use error::{BridgeError, Result};
pub use module::{BridgeStats, RolloutStorage};
