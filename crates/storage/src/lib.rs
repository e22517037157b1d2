//! Storage layer for rollout-kv
//!
//! This crate implements the stores the bridge forwards to:
//! - MemoryStore: DashMap-based store, no disk
//! - FileStore: append-only log with an in-memory index
//! - Log format with CRC32 checksums on the record length and payload
//! - Durability modes: None, Strict, Batched (default, with a background flusher)
//! - Recovery: replay the log, cut torn tails, skip corrupt records
//! - Compaction: rewrite live entries once the log is mostly stale

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod format;
pub mod recovery;
pub mod sharded;
pub mod wal;

pub use file::{CompactionStats, FileStore, FileStoreOptions, LOG_FILE_NAME};
pub use recovery::{RecoveryOptions, RecoveryStats};
pub use sharded::MemoryStore;
pub use wal::DurabilityMode;
