//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check engine behavior over random operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::backing::MemoryStore;
use crate::cache::{Cache, Tags, Ttl};

// == Strategies ==
/// Generates cache keys from a small alphabet so sequences collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

/// Generates non-null JSON values, including falsy ones
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,64}".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|v| json!(v)),
    ]
}

fn tags_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[xyz]", 0..3)
}

/// Every key `key_strategy` can produce
fn all_keys() -> Vec<String> {
    let letters = ['a', 'b', 'c', 'd', 'e'];
    let mut keys: Vec<String> = letters.iter().map(|c| c.to_string()).collect();
    for first in letters {
        for second in letters {
            keys.push(format!("{}{}", first, second));
        }
    }
    keys
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set {
        key: String,
        value: Value,
        tags: Vec<String>,
    },
    Delete {
        key: String,
    },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy(), tags_strategy())
            .prop_map(|(key, value, tags)| CacheOp::Set { key, value, tags }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a non-null value and reading it back returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut cache: Cache<Value> = Cache::new();

        let stored = cache.set(key.clone(), value.clone(), Ttl::Default, Tags::none()).unwrap();
        prop_assert_eq!(stored, Some(value.clone()));
        prop_assert_eq!(cache.get(&key).unwrap(), Some(value));
        prop_assert!(cache.has(&key).unwrap());
    }

    // A null value never creates an entry, even over an existing one.
    #[test]
    fn prop_null_is_noop(key in key_strategy(), value in value_strategy()) {
        let mut cache: Cache<Value> = Cache::new();

        prop_assert_eq!(cache.set(key.clone(), Value::Null, Ttl::Default, Tags::none()).unwrap(), None);
        prop_assert!(!cache.has(&key).unwrap());

        cache.set(key.clone(), value.clone(), Ttl::Default, Tags::none()).unwrap();
        cache.set(key.clone(), Value::Null, Ttl::Default, Tags::none()).unwrap();
        prop_assert_eq!(cache.get(&key).unwrap(), Some(value));
    }

    // Keys are listed in first-insertion order; re-setting does not move a key.
    #[test]
    fn prop_insertion_order(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut cache: Cache<Value> = Cache::new();
        let mut expected: Vec<String> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, tags } => {
                    cache.set(key.clone(), value, Ttl::Default, tags).unwrap();
                    if !expected.contains(&key) {
                        expected.push(key);
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                    expected.retain(|k| k != &key);
                }
            }
        }

        prop_assert_eq!(cache.get_keys(), expected.clone());
        prop_assert_eq!(cache.get_count(), expected.len());
    }

    // Tag queries return exactly the values whose tags intersect the query.
    #[test]
    fn prop_tag_query(
        ops in prop::collection::vec(cache_op_strategy(), 1..40),
        query in tags_strategy(),
    ) {
        let mut cache: Cache<Value> = Cache::new();
        let mut model: Vec<(String, Value, Tags)> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, tags } => {
                    cache.set(key.clone(), value.clone(), Ttl::Default, tags.clone()).unwrap();
                    match model.iter_mut().find(|(k, _, _)| *k == key) {
                        Some(slot) => *slot = (key, value, Tags::from(tags)),
                        None => model.push((key, value, Tags::from(tags))),
                    }
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                    model.retain(|(k, _, _)| *k != key);
                }
            }
        }

        let query = Tags::from(query);
        let expected: Vec<Value> = model
            .into_iter()
            .filter(|(_, _, tags)| tags.intersects(&query))
            .map(|(_, value, _)| value)
            .collect();
        prop_assert_eq!(cache.get_tags(query), expected);
    }

    // The estimated footprint stays strictly under the cap unless a single
    // entry alone reaches it.
    #[test]
    fn prop_memory_cap(
        ops in prop::collection::vec(cache_op_strategy(), 1..60),
        cap in 200usize..1200,
    ) {
        let mut cache: Cache<Value> = Cache::new().with_max_memory_bytes(cap);

        for op in ops {
            match op {
                CacheOp::Set { key, value, tags } => {
                    cache.set(key, value, Ttl::Default, tags).unwrap();
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                }
            }
            prop_assert!(
                cache.get_size() < cap || cache.get_count() == 1,
                "size {} over cap {} with {} entries",
                cache.get_size(),
                cap,
                cache.get_count()
            );
        }
    }

    // Whatever memory evicts, a fresh engine over the same backing store
    // sees every value that was set and not deleted.
    #[test]
    fn prop_write_through_survives_restart(
        ops in prop::collection::vec(cache_op_strategy(), 1..60),
        cap in 200usize..800,
    ) {
        let store = MemoryStore::new();
        let mut cache: Cache<Value> = Cache::new()
            .with_max_memory_bytes(cap)
            .with_backing_store(store.clone());
        let mut model: HashMap<String, Value> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, tags } => {
                    cache.set(key.clone(), value.clone(), Ttl::Default, tags).unwrap();
                    model.insert(key, value);
                }
                CacheOp::Delete { key } => {
                    cache.delete(&key).unwrap();
                    model.remove(&key);
                }
            }
        }

        let mut fresh: Cache<Value> = Cache::new().with_backing_store(store);
        for key in all_keys() {
            prop_assert_eq!(fresh.get(&key).unwrap(), model.get(&key).cloned());
        }
    }
}
