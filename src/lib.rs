//! # rollout-kv
//!
//! Persistent string key-value storage for release rollout state, exposed
//! to a host application runtime as the `RolloutStorage` bridge module.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rollout_kv::prelude::*;
//!
//! // Open a store
//! let kv = RolloutKv::open("./rollout-data")?;
//!
//! // Direct, synchronous access
//! kv.set("deployment:key", "abc123")?;
//! let key = kv.get("deployment:key")?;
//!
//! // Bridge module for the host runtime
//! let storage = kv.bridge()?;
//! storage.set_item("rollout:percent", "25");
//! let percent = storage.get_item("rollout:percent").await?;
//! storage.remove_item("rollout:percent");
//!
//! // Graceful shutdown
//! storage.shutdown().await?;
//! kv.close()?;
//! ```
//!
//! ## Crates
//!
//! - `rollout-kv-core`: the [`KeyValueStore`] trait, errors, limits
//! - `rollout-kv-storage`: [`MemoryStore`] and the log-backed [`FileStore`]
//! - `rollout-kv-bridge`: the [`RolloutStorage`] module and dispatch table

#![warn(missing_docs)]

mod config;
mod database;
mod error;

pub mod prelude;

// Re-export main entry points
pub use config::{Config, ConfigError, DurabilityName, ENV_DURABILITY, ENV_PATH};
pub use database::{RolloutKv, RolloutKvBuilder};
pub use error::{Error, Result};

// Re-export building blocks
pub use rollout_kv_bridge::{
    descriptor, BridgeError, BridgeStats, Invocation, Method, ModuleDescriptor, RolloutStorage,
    MODULE_NAME,
};
pub use rollout_kv_core::{Entry, KeyValueStore};
pub use rollout_kv_storage::{
    CompactionStats, DurabilityMode, FileStore, FileStoreOptions, MemoryStore, RecoveryOptions,
    RecoveryStats, LOG_FILE_NAME,
};
