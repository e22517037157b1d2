//! Storage Integration Tests
//!
//! Tests for the file-backed store: reopen, crash recovery, compaction,
//! locking, and equivalence with an in-memory model.

#[path = "../common/mod.rs"]
mod common;

mod compaction;
mod locking;
mod model;
