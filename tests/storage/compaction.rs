//! Log compaction, explicit and automatic.

use crate::common::*;
use rollout_kv::{DurabilityMode, RolloutKv};
use rollout_kv_storage::format::{LogRecord, LOG_HEADER_SIZE};

#[test]
fn compact_keeps_live_set_and_shrinks_log() {
    let (dir, kv) = temp_store(DurabilityMode::None);
    for i in 0..200 {
        kv.set("rollout:percent", &i.to_string()).unwrap();
        kv.set(&format!("scratch:{}", i), "x").unwrap();
        kv.remove(&format!("scratch:{}", i)).unwrap();
    }
    kv.set("deployment:key", "abc123").unwrap();

    let stats = kv.compact().unwrap();

    assert!(stats.bytes_after < stats.bytes_before);
    assert_eq!(stats.live_keys, 2);
    let expected = LOG_HEADER_SIZE
        + LogRecord::set_len("rollout:percent", "199")
        + LogRecord::set_len("deployment:key", "abc123");
    assert_eq!(stats.bytes_after, expected as u64);
    assert_eq!(log_len(dir.path()), expected as u64);

    assert_eq!(kv.get("rollout:percent").unwrap().as_deref(), Some("199"));
    assert_eq!(kv.len().unwrap(), 2);
}

#[test]
fn compacted_log_reopens_cleanly() {
    let (dir, kv) = temp_store(DurabilityMode::Strict);
    for i in 0..50 {
        kv.set(&format!("k{}", i % 5), &i.to_string()).unwrap();
    }
    kv.compact().unwrap();
    kv.set("after", "compaction").unwrap();
    kv.close().unwrap();

    let kv = reopen(dir.path(), DurabilityMode::Strict);
    assert_eq!(kv.len().unwrap(), 6);
    assert_eq!(kv.get("k4").unwrap().as_deref(), Some("49"));
    assert_eq!(kv.get("after").unwrap().as_deref(), Some("compaction"));
    assert_eq!(kv.recovery_stats().unwrap().records_replayed, 6);
    assert!(!dir.path().join("rollout.log.compact").exists());
}

#[test]
fn compact_empty_store_leaves_header_only() {
    let (dir, kv) = temp_store(DurabilityMode::None);
    kv.set("k", "v").unwrap();
    kv.remove("k").unwrap();

    let stats = kv.compact().unwrap();

    assert_eq!(stats.live_keys, 0);
    assert_eq!(log_len(dir.path()), LOG_HEADER_SIZE as u64);
}

#[test]
fn auto_compaction_bounds_log_growth() {
    let dir = tempfile::tempdir().unwrap();
    let kv = RolloutKv::builder()
        .path(dir.path())
        .no_durability()
        .compaction_ratio(0.5)
        .compaction_min_bytes(4096)
        .open()
        .unwrap();

    let value = "v".repeat(100);
    for _ in 0..1_000 {
        kv.set("hot", &value).unwrap();
    }
    kv.flush().unwrap();

    // 1000 overwrites would be ~120 KB without compaction.
    assert!(log_len(dir.path()) < 16 * 1024, "log is {} bytes", log_len(dir.path()));
    assert_eq!(kv.get("hot").unwrap().as_deref(), Some(value.as_str()));
}

#[test]
fn auto_compaction_waits_for_min_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let kv = RolloutKv::builder()
        .path(dir.path())
        .no_durability()
        .compaction_ratio(0.1)
        .open()
        .unwrap();

    for i in 0..100 {
        kv.set("k", &i.to_string()).unwrap();
    }
    kv.flush().unwrap();

    // Default threshold is 1 MiB of stale data, far above what was written.
    let expected: usize = LOG_HEADER_SIZE
        + (0..100)
            .map(|i| LogRecord::set_len("k", &i.to_string()))
            .sum::<usize>();
    assert_eq!(log_len(dir.path()), expected as u64);
}
