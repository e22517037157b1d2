//! The file store behaves like a map, before and after reopen.

use std::collections::BTreeMap;

use crate::common::*;
use proptest::prelude::*;
use rollout_kv::{DurabilityMode, KeyValueStore, MemoryStore};

#[derive(Debug, Clone)]
enum Op {
    Set(String, String),
    Remove(String),
    Compact,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small key space so overwrites and removes hit existing keys.
    let key = prop::sample::select(vec!["a", "b", "c", "d", "rollout:percent"])
        .prop_map(str::to_string);
    prop_oneof![
        6 => (key.clone(), ".{0,24}").prop_map(|(k, v)| Op::Set(k, v)),
        3 => key.prop_map(Op::Remove),
        1 => Just(Op::Compact),
    ]
}

fn snapshot(store: &dyn KeyValueStore) -> BTreeMap<String, String> {
    store.entries().unwrap().into_iter().map(|e| (e.key, e.value)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn file_store_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (dir, kv) = temp_store(DurabilityMode::None);
        let mut model = BTreeMap::new();

        for op in &ops {
            match op {
                Op::Set(k, v) => {
                    kv.set(k, v).unwrap();
                    model.insert(k.clone(), v.clone());
                }
                Op::Remove(k) => {
                    let existed = kv.remove(k).unwrap();
                    prop_assert_eq!(existed, model.remove(k).is_some());
                }
                Op::Compact => {
                    kv.compact().unwrap();
                }
            }
        }
        prop_assert_eq!(&snapshot(kv.store().as_ref()), &model);

        kv.close().unwrap();
        let kv = reopen(dir.path(), DurabilityMode::None);
        prop_assert_eq!(&snapshot(kv.store().as_ref()), &model);
        prop_assert!(!kv.recovery_stats().unwrap().has_issues());
    }

    #[test]
    fn file_and_memory_stores_agree(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (_dir, kv) = temp_store(DurabilityMode::None);
        let memory = MemoryStore::new();

        for op in &ops {
            match op {
                Op::Set(k, v) => {
                    kv.set(k, v).unwrap();
                    memory.set(k, v).unwrap();
                }
                Op::Remove(k) => {
                    prop_assert_eq!(kv.remove(k).unwrap(), memory.remove(k).unwrap());
                }
                Op::Compact => {
                    kv.compact().unwrap();
                }
            }
            prop_assert_eq!(kv.keys().unwrap(), memory.keys().unwrap());
        }
        prop_assert_eq!(snapshot(kv.store().as_ref()), snapshot(&memory));
    }
}
