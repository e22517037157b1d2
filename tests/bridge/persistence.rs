//! Bridge over a file-backed store: writes outlive the process.

use std::time::Duration;

use crate::common::*;
use rollout_kv::{DurabilityMode, RolloutKv};
use rollout_kv_storage::format::LOG_HEADER_SIZE;

#[tokio::test]
async fn bridge_writes_survive_reopen() {
    let (dir, kv) = temp_store(DurabilityMode::Strict);
    {
        let storage = kv.bridge().unwrap();
        storage.set_item("deployment:key", "abc123");
        storage.set_item("rollout:percent", "25");
        storage.set_item("rollout:percent", "50");
        storage.remove_item("deployment:key");
        storage.shutdown().await.unwrap();
    }
    kv.close().unwrap();

    let kv = reopen(dir.path(), DurabilityMode::Strict);
    let storage = kv.bridge().unwrap();
    assert_eq!(
        storage.get_item("rollout:percent").await.unwrap().as_deref(),
        Some("50")
    );
    assert_eq!(storage.get_item("deployment:key").await.unwrap(), None);
}

#[tokio::test]
async fn batched_writes_reach_disk_on_shutdown() {
    let (dir, kv) = temp_store(DurabilityMode::Batched {
        interval_ms: 60_000,
        batch_size: 1_000_000,
    });
    let storage = kv.bridge().unwrap();
    for i in 0..50 {
        storage.set_item(format!("k{}", i), i.to_string());
    }
    storage.shutdown().await.unwrap();
    kv.close().unwrap();

    let kv = reopen(dir.path(), DurabilityMode::None);
    assert_eq!(kv.len().unwrap(), 50);
    assert_eq!(kv.recovery_stats().unwrap().records_replayed, 50);
}

#[tokio::test]
async fn lone_batched_write_reaches_disk_after_interval() {
    let dir = tempfile::tempdir().unwrap();
    let kv = RolloutKv::builder()
        .path(dir.path())
        .buffered_with(20, 1000)
        .open()
        .unwrap();
    let storage = kv.bridge().unwrap();
    storage.set_item("deployment:key", "abc123");
    storage.sync().await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(log_len(dir.path()) > LOG_HEADER_SIZE as u64);

    // Crash: nothing is flushed or unlocked on the way out.
    std::mem::forget(storage);
    std::mem::forget(kv);

    let copy = tempfile::tempdir().unwrap();
    std::fs::copy(log_path(dir.path()), log_path(copy.path())).unwrap();
    let kv = reopen(copy.path(), DurabilityMode::Strict);
    assert_eq!(kv.get("deployment:key").unwrap().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn closed_store_rejects_get_and_counts_writes() {
    let (_dir, kv) = temp_store(DurabilityMode::None);
    let storage = kv.bridge().unwrap();
    kv.close().unwrap();

    let err = storage.get_item("k").await.unwrap_err();
    assert_eq!(err.code(), "E_STORAGE");

    storage.set_item("k", "v");
    storage.sync().await.unwrap();
    assert_eq!(storage.stats().failures, 1);
}

#[tokio::test]
async fn oversized_value_is_swallowed_not_fatal() {
    let (_dir, kv) = temp_store(DurabilityMode::None);
    let storage = kv.bridge().unwrap();

    let huge = "x".repeat(rollout_kv_core::MAX_VALUE_LEN + 1);
    storage.set_item("big", huge);
    storage.set_item("small", "ok");

    assert_eq!(storage.get_item("big").await.unwrap(), None);
    assert_eq!(storage.get_item("small").await.unwrap().as_deref(), Some("ok"));
    assert_eq!(storage.stats().failures, 1);
}
