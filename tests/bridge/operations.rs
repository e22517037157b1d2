//! setItem / getItem / removeItem semantics.

use crate::common::*;
use proptest::prelude::*;

// ============================================================================
// Read after write
// ============================================================================

#[tokio::test]
async fn get_after_set_returns_value() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("rollout:percent", "25");
    let value = storage.get_item("rollout:percent").await.unwrap();

    assert_eq!(value.as_deref(), Some("25"));
}

#[tokio::test]
async fn second_set_overwrites_first() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("k", "v1");
    storage.set_item("k", "v2");

    assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn empty_key_and_value_are_ordinary_strings() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("", "");
    assert_eq!(storage.get_item("").await.unwrap().as_deref(), Some(""));

    storage.set_item("unicode:ключ", "värde ✓");
    assert_eq!(
        storage.get_item("unicode:ключ").await.unwrap().as_deref(),
        Some("värde ✓")
    );
}

// ============================================================================
// Absence
// ============================================================================

#[tokio::test]
async fn get_never_set_resolves_to_none() {
    let (_kv, storage) = memory_bridge();

    for _ in 0..3 {
        assert_eq!(storage.get_item("never-set").await.unwrap(), None);
    }
}

#[tokio::test]
async fn get_after_remove_resolves_to_none() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("k", "v");
    storage.remove_item("k");

    assert_eq!(storage.get_item("k").await.unwrap(), None);
}

#[tokio::test]
async fn remove_missing_key_is_noop() {
    let (kv, storage) = memory_bridge();
    storage.set_item("other", "kept");

    storage.remove_item("missing");
    storage.remove_item("missing");
    storage.sync().await.unwrap();

    assert_eq!(storage.stats().failures, 0);
    assert_eq!(kv.keys().unwrap(), vec!["other".to_string()]);
}

#[tokio::test]
async fn set_after_remove_restores_key() {
    let (_kv, storage) = memory_bridge();

    storage.set_item("k", "v1");
    storage.remove_item("k");
    storage.set_item("k", "v2");

    assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v2"));
}

// ============================================================================
// Properties
// ============================================================================

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn set_then_get_for_any_strings(key in ".{0,32}", value in ".{0,128}") {
        let (_kv, storage) = memory_bridge();
        let got = runtime().block_on(async {
            storage.set_item(key.clone(), value.clone());
            storage.get_item(key.clone()).await.unwrap()
        });
        prop_assert_eq!(got, Some(value));
    }

    #[test]
    fn last_write_wins_for_any_strings(key in ".{0,32}", v1 in ".{0,64}", v2 in ".{0,64}") {
        let (_kv, storage) = memory_bridge();
        let got = runtime().block_on(async {
            storage.set_item(key.clone(), v1);
            storage.set_item(key.clone(), v2.clone());
            storage.get_item(key.clone()).await.unwrap()
        });
        prop_assert_eq!(got, Some(v2));
    }

    #[test]
    fn remove_then_get_for_any_key(key in ".{0,32}", value in ".{0,64}") {
        let (_kv, storage) = memory_bridge();
        let got = runtime().block_on(async {
            storage.set_item(key.clone(), value);
            storage.remove_item(key.clone());
            storage.get_item(key.clone()).await.unwrap()
        });
        prop_assert_eq!(got, None);
    }
}
