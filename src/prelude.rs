//! Convenient imports for rollout-kv.
//!
//! ```ignore
//! use rollout_kv::prelude::*;
//!
//! let kv = RolloutKv::open("./rollout-data")?;
//! kv.set("key", "value")?;
//! ```

// Main entry point
pub use crate::database::{RolloutKv, RolloutKvBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::Config;

// Bridge module
pub use rollout_kv_bridge::{Invocation, RolloutStorage};

// Store trait and modes
pub use rollout_kv_core::KeyValueStore;
pub use rollout_kv_storage::DurabilityMode;
