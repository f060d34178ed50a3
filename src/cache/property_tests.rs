//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the facade's invariants over generated keys,
//! payloads and operation sequences.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{key, Backend, CacheFacade, LocalFileStore, RemoteEntryStore, MAX_KEY_LENGTH};
use crate::config::{BackendKind, Config};

const NO_TAGS: &[&str] = &[];

// == Strategies ==
/// Route-like keys, optionally with a query string that may hold lists
fn route_key_strategy() -> impl Strategy<Value = String> {
    ("/[a-z0-9_]{1,16}(/[a-z0-9_]{1,8}){0,3}", proptest::option::of("[a-z]{1,6}=[0-9,]{1,6}"))
        .prop_map(|(path, query)| match query {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        })
}

/// Any printable key with a leading slash: commas, percent signs, dot
/// segments and trailing `/` or `?` included
fn printable_key_strategy() -> impl Strategy<Value = String> {
    "/[ -~]{0,60}"
}

/// Path-shaped keys over a small alphabet that is heavy on separators
fn separator_key_strategy() -> impl Strategy<Value = String> {
    "/[a-c0-2.,=?/ %]{0,24}"
}

/// Arbitrary printable keys, including ones past the hashing threshold
fn any_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,400}").unwrap()
}

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..256)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Add { key: String, value: Vec<u8> },
    Find { key: String },
    Smash { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (route_key_strategy(), payload_strategy())
            .prop_map(|(key, value)| CacheOp::Add { key, value }),
        route_key_strategy().prop_map(|key| CacheOp::Find { key }),
        route_key_strategy().prop_map(|key| CacheOp::Smash { key }),
    ]
}

fn facade() -> (RemoteEntryStore, CacheFacade) {
    let store = RemoteEntryStore::new(None);
    let config = Config {
        enabled: true,
        namespace: "prop".to_string(),
        ..Config::default()
    };
    let cache = CacheFacade::with_backend(config, Arc::new(store.clone()));
    (store, cache)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Adding a key and finding it returns the stored payload.
    #[test]
    fn prop_add_find_round_trip(key in printable_key_strategy(), value in payload_strategy()) {
        let (_store, mut cache) = facade();

        prop_assert!(cache.add(&key, &value, None, NO_TAGS));
        prop_assert_eq!(cache.find(&key), Some(value));
    }

    // A second add never clobbers; replace always does.
    #[test]
    fn prop_add_is_no_clobber(
        key in printable_key_strategy(),
        first in payload_strategy(),
        second in payload_strategy()
    ) {
        let (_store, mut cache) = facade();

        cache.add(&key, &first, None, NO_TAGS);
        prop_assert!(!cache.add(&key, &second, None, NO_TAGS));
        prop_assert_eq!(cache.find(&key), Some(first));

        prop_assert!(cache.replace(&key, &second, None, NO_TAGS));
        prop_assert_eq!(cache.find(&key), Some(second));
    }

    // Shortening is idempotent and only touches keys at or past the threshold.
    #[test]
    fn prop_shorten_idempotent(key in any_key_strategy()) {
        let once = key::shorten(&key);
        prop_assert_eq!(key::shorten(&once), once.clone());

        if key.chars().count() < MAX_KEY_LENGTH {
            prop_assert_eq!(once, key);
        } else {
            prop_assert_eq!(once.len(), 40);
            prop_assert!(once.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    // Every key written under a tag is gone after sweeping that tag.
    #[test]
    fn prop_tag_sweep_complete(
        keys in prop::collection::hash_set(printable_key_strategy(), 1..20),
        tag in "[a-z]{1,12}"
    ) {
        let (store, mut cache) = facade();
        for key in &keys {
            cache.replace(key, b"payload", None, &[tag.as_str()]);
        }

        cache.smash_by_tag(&tag);

        for key in &keys {
            prop_assert_eq!(cache.find(key), None);
        }
        prop_assert!(!store.exists(&key::tag_path(&tag)).unwrap());
    }

    // Hit and miss counters match what find actually returned.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (_store, mut cache) = facade();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Add { key, value } => {
                    cache.add(&key, &value, None, NO_TAGS);
                }
                CacheOp::Find { key } => match cache.find(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Smash { key } => cache.smash(&key, Some(false)),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
    }

    // Exact-key smashing keeps the object count equal to the live entries.
    #[test]
    fn prop_object_count_tracks_exact_deletes(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let (store, mut cache) = facade();

        for op in ops {
            match op {
                CacheOp::Add { key, value } => {
                    cache.add(&key, &value, None, NO_TAGS);
                }
                CacheOp::Find { key } => {
                    cache.find(&key);
                }
                CacheOp::Smash { key } => cache.smash(&key, Some(false)),
            }
        }

        prop_assert_eq!(cache.stats().objects, store.len() as u64);
    }

    // Huge TTLs are clamped instead of overflowing.
    #[test]
    fn prop_any_ttl_is_accepted(key in route_key_strategy(), ttl_secs in any::<u64>()) {
        let (_store, mut cache) = facade();

        prop_assert!(cache.add(&key, b"v", Some(Duration::from_secs(ttl_secs)), &["t"]));
        prop_assert_eq!(cache.find(&key), Some(b"v".to_vec()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // The file store's on-disk count matches the facade's object count,
    // and a reopened store discovers the same count.
    #[test]
    fn prop_file_store_count_matches(
        keys in prop::collection::vec(separator_key_strategy(), 1..20)
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            enabled: true,
            namespace: "prop".to_string(),
            backend: BackendKind::File,
            cache_path: dir.path().join("cache"),
            expire_log_path: dir.path().join("expire_logs"),
            ..Config::default()
        };
        let mut cache = CacheFacade::from_config(config);

        for key in &keys {
            cache.add(key, b"v", None, NO_TAGS);
        }

        let reopened = LocalFileStore::new(dir.path().join("cache"), dir.path().join("expire_logs"), 5000);
        prop_assert_eq!(reopened.len().unwrap() as u64, cache.stats().objects);
    }
}
