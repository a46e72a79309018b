// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryTier`.

use std::time::{Duration, SystemTime};

use futures::executor::block_on;
use ridecache_memory::{InMemoryTier, InMemoryTierBuilder};
use ridecache_tier::{CacheEntry, CacheTier, FreshnessWindow};

fn entry(value: i32) -> CacheEntry<i32> {
    CacheEntry::new(
        value,
        SystemTime::UNIX_EPOCH,
        FreshnessWindow::new(Duration::from_secs(120), Duration::from_secs(3600)),
    )
}

fn key(s: &str) -> String {
    s.to_string()
}

#[test]
fn get_returns_inserted_entry() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::new();
        tier.insert(&key("a"), entry(1)).await.unwrap();

        let found = tier.get(&key("a")).await.unwrap().unwrap();
        assert_eq!(found, entry(1));
        assert!(tier.get(&key("b")).await.unwrap().is_none());
    });
}

#[test]
fn never_exceeds_bound() {
    block_on(async {
        let tier = InMemoryTierBuilder::<String, i32>::new().max_entries(100).build();
        for i in 0..101 {
            tier.insert(&format!("k{i}"), entry(i)).await.unwrap();
        }

        assert_eq!(tier.len(), Some(100));
        assert!(!tier.contains_key(&key("k0")));
        assert!(tier.contains_key(&key("k1")));
        assert!(tier.contains_key(&key("k100")));
        assert_eq!(tier.evictions(), 1);
    });
}

#[test]
fn eviction_ignores_freshness() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::with_max_entries(2);
        let fresh = CacheEntry::new(1, SystemTime::now(), FreshnessWindow::new(Duration::from_secs(3600), Duration::ZERO));
        tier.insert(&key("fresh"), fresh).await.unwrap();
        tier.insert(&key("old"), entry(2)).await.unwrap();
        tier.insert(&key("new"), entry(3)).await.unwrap();

        assert!(!tier.contains_key(&key("fresh")));
        assert_eq!(tier.keys_oldest_first(), vec![key("old"), key("new")]);
    });
}

#[test]
fn overwrite_does_not_evict_and_moves_to_newest() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::with_max_entries(2);
        tier.insert(&key("a"), entry(1)).await.unwrap();
        tier.insert(&key("b"), entry(2)).await.unwrap();
        tier.insert(&key("a"), entry(10)).await.unwrap();

        assert_eq!(tier.len(), Some(2));
        assert_eq!(tier.evictions(), 0);
        assert_eq!(tier.keys_oldest_first(), vec![key("b"), key("a")]);

        // "b" is now the oldest and goes first.
        tier.insert(&key("c"), entry(3)).await.unwrap();
        assert_eq!(tier.keys_oldest_first(), vec![key("a"), key("c")]);
        assert_eq!(*tier.get(&key("a")).await.unwrap().unwrap().value(), 10);
    });
}

#[test]
fn invalidate_is_idempotent_and_frees_a_slot() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::with_max_entries(2);
        tier.insert(&key("a"), entry(1)).await.unwrap();
        tier.insert(&key("b"), entry(2)).await.unwrap();

        tier.invalidate(&key("a")).await.unwrap();
        tier.invalidate(&key("a")).await.unwrap();
        tier.insert(&key("c"), entry(3)).await.unwrap();

        assert_eq!(tier.evictions(), 0);
        assert_eq!(tier.keys_oldest_first(), vec![key("b"), key("c")]);
    });
}

#[test]
fn clear_empties_tier() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::new();
        tier.insert(&key("a"), entry(1)).await.unwrap();
        tier.insert(&key("b"), entry(2)).await.unwrap();

        tier.clear().await.unwrap();

        assert_eq!(tier.len(), Some(0));
        assert_eq!(tier.is_empty(), Some(true));
        assert!(tier.keys_oldest_first().is_empty());
    });
}

#[test]
fn clones_share_state() {
    block_on(async {
        let tier = InMemoryTier::<String, i32>::new();
        let other = tier.clone();
        tier.insert(&key("a"), entry(1)).await.unwrap();

        assert!(other.contains_key(&key("a")));
    });
}
