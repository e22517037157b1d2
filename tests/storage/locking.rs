//! Exclusive ownership of a store directory.

use crate::common::*;
use rollout_kv::{DurabilityMode, RolloutKv};

#[test]
fn second_open_of_locked_store_fails() {
    let (dir, _kv) = temp_store(DurabilityMode::None);

    let err = RolloutKv::open(dir.path()).err().unwrap();

    assert!(err.to_string().contains("locked"), "unexpected error: {}", err);
}

#[test]
fn close_releases_lock() {
    let (dir, kv) = temp_store(DurabilityMode::None);
    kv.set("k", "v").unwrap();
    kv.close().unwrap();

    let kv = RolloutKv::open(dir.path()).unwrap();
    assert_eq!(kv.get("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn drop_releases_lock() {
    let (dir, kv) = temp_store(DurabilityMode::None);
    drop(kv);

    assert!(RolloutKv::open(dir.path()).is_ok());
}

#[test]
fn lock_left_by_dead_process_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    // A lock file whose holder has exited: present on disk, not locked.
    std::fs::write(dir.path().join("rollout.log.lock"), "99999\n").unwrap();

    let kv = RolloutKv::open(dir.path()).unwrap();
    kv.set("k", "v").unwrap();
}

#[test]
fn lock_file_survives_close_and_is_reused() {
    let (dir, kv) = temp_store(DurabilityMode::None);
    kv.close().unwrap();
    assert!(dir.path().join("rollout.log.lock").exists());

    let kv = RolloutKv::open(dir.path()).unwrap();
    assert!(RolloutKv::open(dir.path()).is_err());
    drop(kv);
    assert!(RolloutKv::open(dir.path()).is_ok());
}

#[test]
fn closed_store_rejects_operations() {
    let (_dir, kv) = temp_store(DurabilityMode::None);
    kv.close().unwrap();
    kv.close().unwrap();

    assert!(kv.get("k").unwrap_err().is_closed());
    assert!(kv.set("k", "v").unwrap_err().is_closed());
    assert!(kv.remove("k").unwrap_err().is_closed());
    assert!(kv.keys().unwrap_err().is_closed());
}
