//! Call ordering and lifecycle of the worker.

use std::sync::Arc;

use crate::common::*;
use rollout_kv::{BridgeError, KeyValueStore, MemoryStore};

#[tokio::test]
async fn calls_apply_in_submission_order() {
    let (_kv, storage) = memory_bridge();

    for i in 0..1_000 {
        storage.set_item("counter", i.to_string());
    }

    assert_eq!(
        storage.get_item("counter").await.unwrap().as_deref(),
        Some("999")
    );
}

#[tokio::test]
async fn interleaved_set_remove_follow_submission_order() {
    let (_kv, storage) = memory_bridge();

    for i in 0..100 {
        storage.set_item(format!("k{}", i), "v");
        if i % 2 == 0 {
            storage.remove_item(format!("k{}", i));
        }
    }
    storage.sync().await.unwrap();

    for i in 0..100 {
        let got = storage.get_item(format!("k{}", i)).await.unwrap();
        assert_eq!(got.is_some(), i % 2 == 1, "key k{}", i);
    }
}

#[tokio::test]
async fn clones_from_many_tasks_share_one_queue() {
    let (kv, storage) = memory_bridge();

    let mut handles = Vec::new();
    for t in 0..8 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                storage.set_item(format!("t{}:{}", t, i), i.to_string());
            }
            storage.get_item(format!("t{}:49", t)).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().as_deref(), Some("49"));
    }

    storage.sync().await.unwrap();
    assert_eq!(kv.len().unwrap(), 400);
    assert_eq!(storage.stats().writes, 400);
}

#[tokio::test]
async fn stats_count_each_operation() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("a", "1");
    storage.set_item("b", "2");
    storage.remove_item("a");
    storage.get_item("b").await.unwrap();

    let stats = storage.stats();
    assert_eq!(stats.writes, 2);
    assert_eq!(stats.removes, 1);
    assert_eq!(stats.reads, 1);
    assert_eq!(stats.failures, 0);
}

#[tokio::test]
async fn shutdown_drains_queue_before_stopping() {
    let store = Arc::new(MemoryStore::new());
    let storage = bridge_over(store.clone());

    for i in 0..100 {
        storage.set_item(format!("k{}", i), "v");
    }
    storage.shutdown().await.unwrap();

    assert_eq!(store.len().unwrap(), 100);
    assert!(storage.is_shut_down());
}

#[tokio::test]
async fn calls_after_shutdown_are_refused() {
    let (_kv, storage) = memory_bridge();
    storage.shutdown().await.unwrap();

    let err = storage.get_item("k").await.unwrap_err();
    assert!(matches!(err, BridgeError::Shutdown));
    assert_eq!(err.code(), "E_SHUTDOWN");

    storage.set_item("k", "v");
    storage.remove_item("k");
    assert_eq!(storage.stats().failures, 2);
    assert!(storage.sync().await.is_err());
}

#[tokio::test]
async fn dropping_get_future_does_not_stall_queue() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("k", "v");
    drop(storage.get_item("k"));
    storage.set_item("k", "v2");

    assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v2"));
}
