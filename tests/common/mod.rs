//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rollout_kv::{DurabilityMode, RolloutKv, RolloutStorage, LOG_FILE_NAME};
use tempfile::TempDir;

/// Open a disk-backed store in a fresh temp directory.
pub fn temp_store(mode: DurabilityMode) -> (TempDir, RolloutKv) {
    let dir = TempDir::new().unwrap();
    let kv = reopen(dir.path(), mode);
    (dir, kv)
}

/// Open (or reopen) the store in `dir` with strict recovery.
pub fn reopen(dir: &Path, mode: DurabilityMode) -> RolloutKv {
    RolloutKv::builder()
        .path(dir)
        .durability(mode)
        .open()
        .unwrap()
}

/// Bridge module over a fresh in-memory store.
pub fn memory_bridge() -> (RolloutKv, RolloutStorage) {
    let kv = RolloutKv::ephemeral();
    let storage = kv.bridge().unwrap();
    (kv, storage)
}

/// Bridge module over a caller-supplied store.
pub fn bridge_over(store: Arc<dyn rollout_kv::KeyValueStore>) -> RolloutStorage {
    RolloutStorage::new(store).unwrap()
}

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

pub fn log_len(dir: &Path) -> u64 {
    fs::metadata(log_path(dir)).unwrap().len()
}

/// Append raw bytes to the log, simulating a torn or garbage write.
pub fn append_raw(dir: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(log_path(dir)).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

/// Flip one byte of the log at `offset`.
pub fn flip_byte(dir: &Path, offset: u64) {
    let path = log_path(dir);
    let mut bytes = fs::read(&path).unwrap();
    bytes[offset as usize] ^= 0xFF;
    fs::write(&path, bytes).unwrap();
}

/// Chop `n` bytes off the end of the log.
pub fn truncate_tail(dir: &Path, n: u64) {
    let file = OpenOptions::new().write(true).open(log_path(dir)).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - n).unwrap();
}
