//! Bridge Integration Tests
//!
//! Tests for the RolloutStorage module: the three exported operations,
//! call ordering, persistence through a file store, and dispatch by name.

#[path = "../common/mod.rs"]
mod common;

mod operations;
mod ordering;
mod persistence;
