// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the two-tier store.

use std::sync::Arc;
use std::time::Duration;

use ridecache::{CacheStore, FreshnessPolicy, Lookup, Overrides};
use ridecache_durable::{DurableTier, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use ridecache_tier::testing::{CacheOp, LogCapture, MockCache};
use tick::ClockControl;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn scenario_policy() -> FreshnessPolicy {
    FreshnessPolicy::new("scenario:", Duration::from_secs(120), Duration::from_secs(3_600))
}

#[test]
fn concrete_freshness_scenario() {
    block_on(async {
        let control = ClockControl::new();
        let durable = MockCache::<String, &str>::new();
        let store = CacheStore::builder::<&str>(control.to_clock()).durable(durable.clone()).build();
        let policy = scenario_policy();

        store.set("k", "v1", &policy, Overrides::new()).await;

        control.advance(Duration::from_secs(60));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Fresh("v1"));

        control.advance(Duration::from_secs(140));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Stale("v1"));

        control.advance(Duration::from_secs(3_800));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);
        assert!(store.is_empty());
        assert!(!durable.contains_key(&"scenario:k".to_string()));

        store.set("k", "v2", &policy, Overrides::new()).await;
        control.advance(Duration::from_secs(1));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Fresh("v2"));
    });
}

#[test]
fn classification_boundaries_are_half_open() {
    block_on(async {
        let control = ClockControl::new();
        let store = CacheStore::builder::<u32>(control.to_clock()).build();
        let policy = scenario_policy();

        store.set("k", 1, &policy, Overrides::new()).await;

        control.advance(Duration::from_secs(120) - Duration::from_millis(1));
        assert!(store.get("k", &policy, Overrides::new()).await.is_fresh());

        control.advance(Duration::from_millis(1));
        assert!(store.get("k", &policy, Overrides::new()).await.is_stale());

        control.advance(Duration::from_secs(3_600) - Duration::from_millis(1));
        assert!(store.get("k", &policy, Overrides::new()).await.is_stale());

        control.advance(Duration::from_millis(1));
        assert!(store.get("k", &policy, Overrides::new()).await.is_miss());
    });
}

#[test]
fn read_overrides_take_precedence_over_stored_window() {
    block_on(async {
        let control = ClockControl::new();
        let store = CacheStore::builder::<u32>(control.to_clock()).build();
        let policy = scenario_policy();

        store.set("k", 1, &policy, Overrides::new()).await;
        control.advance(Duration::from_secs(150));

        let longer = Overrides::new().with_max_age(Duration::from_secs(300));
        assert_eq!(store.get("k", &policy, longer).await, Lookup::Fresh(1));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Stale(1));
    });
}

#[test]
fn write_overrides_are_stored_with_the_entry() {
    block_on(async {
        let control = ClockControl::new();
        let store = CacheStore::builder::<u32>(control.to_clock()).build();
        let policy = scenario_policy();

        store.set("k", 1, &policy, Overrides::window(Duration::from_secs(10), Duration::from_secs(10))).await;

        control.advance(Duration::from_secs(15));
        assert!(store.get("k", &policy, Overrides::new()).await.is_stale());

        control.advance(Duration::from_secs(5));
        assert!(store.get("k", &policy, Overrides::new()).await.is_miss());
    });
}

#[test]
fn eviction_bound_removes_only_the_oldest_insertion() {
    block_on(async {
        let store = CacheStore::builder::<usize>(ClockControl::new().to_clock())
            .memory_capacity(3)
            .build();
        let policy = FreshnessPolicy::STATIC_CONTENT;

        for i in 0..3 {
            store.set(&format!("k{i}"), i, &policy, Overrides::new()).await;
        }
        store.set("k3", 3, &policy, Overrides::new()).await;

        assert_eq!(store.len(), 3);
        assert!(store.get("k0", &policy, Overrides::new()).await.is_miss());
        for i in 1..4 {
            assert_eq!(store.get(&format!("k{i}"), &policy, Overrides::new()).await, Lookup::Fresh(i));
        }
    });
}

#[test]
fn categories_do_not_share_keys() {
    block_on(async {
        let store = CacheStore::builder::<&str>(ClockControl::new().to_clock()).build();

        store.set("1", "profile", &FreshnessPolicy::USER_PROFILE, Overrides::new()).await;
        store.set("1", "ride", &FreshnessPolicy::RIDE_LISTINGS, Overrides::new()).await;

        assert_eq!(
            store.get("1", &FreshnessPolicy::USER_PROFILE, Overrides::new()).await,
            Lookup::Fresh("profile")
        );
        assert_eq!(
            store.get("1", &FreshnessPolicy::RIDE_LISTINGS, Overrides::new()).await,
            Lookup::Fresh("ride")
        );
    });
}

#[test]
fn durable_hit_is_promoted_to_memory() {
    block_on(async {
        let control = ClockControl::new();
        let kv = Arc::new(MemoryKeyValueStore::new());
        let policy = FreshnessPolicy::RIDE_LISTINGS;

        let writer = CacheStore::builder::<String>(control.to_clock())
            .durable(DurableTier::new(Arc::clone(&kv)))
            .build();
        writer.set("ride:1", "Campus -> Airport".to_string(), &policy, Overrides::new()).await;

        let reader = CacheStore::builder::<String>(control.to_clock())
            .durable(DurableTier::new(Arc::clone(&kv)))
            .build();
        assert!(reader.is_empty());

        control.advance(Duration::from_secs(130));
        assert_eq!(
            reader.get("ride:1", &policy, Overrides::new()).await,
            Lookup::Stale("Campus -> Airport".to_string())
        );
        assert_eq!(reader.len(), 1);
    });
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let control = ClockControl::new();
    let policy = FreshnessPolicy::USER_PROFILE;

    block_on(async {
        let store = CacheStore::builder::<Vec<u32>>(control.to_clock())
            .durable(DurableTier::new(FileKeyValueStore::open(&path).unwrap()))
            .build();
        store.set("wallet:u1", vec![100, 250], &policy, Overrides::new()).await;
    });

    control.advance(Duration::from_secs(60));

    block_on(async {
        let store = CacheStore::builder::<Vec<u32>>(control.to_clock())
            .durable(DurableTier::new(FileKeyValueStore::open(&path).unwrap()))
            .build();
        assert_eq!(
            store.get("wallet:u1", &policy, Overrides::new()).await,
            Lookup::Fresh(vec![100, 250])
        );

        store.clear().await;
    });

    let reopened = FileKeyValueStore::open(&path).unwrap();
    assert!(reopened.keys().unwrap().is_empty());
}

#[test]
fn durable_write_failure_is_swallowed_and_logged() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    block_on(async {
        let store = CacheStore::builder::<String>(ClockControl::new().to_clock())
            .durable(DurableTier::new(MemoryKeyValueStore::with_quota(16)))
            .build();
        let policy = FreshnessPolicy::API_RESPONSES;

        store.set("/big", "x".repeat(64), &policy, Overrides::new()).await;

        assert_eq!(store.get("/big", &policy, Overrides::new()).await, Lookup::Fresh("x".repeat(64)));
        assert!(store.durable().store().is_empty());
    });

    capture.assert_contains("WARN");
    capture.assert_contains("durable write failed");
}

#[test]
fn rejected_overwrite_does_not_resurrect_the_older_value() {
    block_on(async {
        let store = CacheStore::builder::<String>(ClockControl::new().to_clock())
            .memory_capacity(1)
            .durable(DurableTier::new(MemoryKeyValueStore::with_quota(120)))
            .build();
        let policy = FreshnessPolicy::API_RESPONSES;

        store.set("/a", "x".to_string(), &policy, Overrides::new()).await;
        assert_eq!(store.durable().store().len(), 1);

        store.set("/a", "x".repeat(200), &policy, Overrides::new()).await;
        assert!(store.durable().store().is_empty());

        store.set("/b", "y".to_string(), &policy, Overrides::new()).await;
        assert_eq!(store.get("/a", &policy, Overrides::new()).await, Lookup::Miss);
        assert_eq!(store.get("/b", &policy, Overrides::new()).await, Lookup::Fresh("y".to_string()));
    });
}

#[test]
fn failed_write_and_removal_hide_the_older_durable_record() {
    block_on(async {
        let durable = MockCache::<String, u32>::new();
        let store = CacheStore::builder::<u32>(ClockControl::new().to_clock())
            .memory_capacity(1)
            .durable(durable.clone())
            .build();
        let policy = FreshnessPolicy::USER_PROFILE;
        let key = "user_profile:k".to_string();

        store.set("k", 1, &policy, Overrides::new()).await;
        durable.fail_when(|op| match op {
            CacheOp::Insert { entry, .. } => *entry.value() == 2,
            CacheOp::Invalidate(_) => true,
            _ => false,
        });
        store.set("k", 2, &policy, Overrides::new()).await;
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Fresh(2));

        store.set("other", 9, &policy, Overrides::new()).await;
        assert!(durable.contains_key(&key));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);

        durable.clear_failures();
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);
        assert!(!durable.contains_key(&key));
    });
}

#[test]
fn failed_durable_delete_keeps_the_key_unservable() {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    block_on(async {
        let durable = MockCache::<String, u32>::new();
        let store = CacheStore::builder::<u32>(ClockControl::new().to_clock())
            .durable(durable.clone())
            .build();
        let policy = FreshnessPolicy::USER_PROFILE;
        let key = "user_profile:k".to_string();

        store.set("k", 1, &policy, Overrides::new()).await;
        durable.fail_when(|op| matches!(op, CacheOp::Invalidate(_)));

        store.delete("k", &policy).await;
        assert!(durable.contains_key(&key));
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);

        durable.clear_failures();
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Miss);
        assert!(!durable.contains_key(&key));

        store.set("k", 3, &policy, Overrides::new()).await;
        assert_eq!(store.get("k", &policy, Overrides::new()).await, Lookup::Fresh(3));
    });

    capture.assert_contains("durable delete failed");
}
