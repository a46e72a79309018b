// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The two-tier cache store.

use std::collections::HashSet;

use parking_lot::Mutex;
use ridecache_memory::InMemoryTier;
use ridecache_tier::{CacheEntry, CacheTier, Freshness, NoopTier};
use tick::Clock;

use crate::{
    builder::CacheStoreBuilder,
    policy::{FreshnessPolicy, Overrides},
    telemetry::{
        CacheActivity, CacheOperation, CacheTelemetry,
        ext::{CacheTelemetryExt, ClockExt},
    },
};

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

/// The name a store reports in telemetry unless one is configured.
pub const DEFAULT_CACHE_NAME: CacheName = "ridecache";

/// Outcome of a cache read.
///
/// `Stale` values are still safe to show, but the caller should arrange a refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The entry is younger than its `max_age`.
    Fresh(T),
    /// The entry is past `max_age` but inside its stale-while-revalidate window.
    Stale(T),
    /// Nothing usable is cached.
    Miss,
}

impl<T> Lookup<T> {
    /// Returns true for [`Lookup::Fresh`].
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// Returns true for [`Lookup::Stale`].
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    /// Returns true for [`Lookup::Miss`].
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Returns the value, fresh or stale.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }

    /// Consumes the lookup and returns the value, fresh or stale.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(value) | Self::Stale(value) => Some(value),
            Self::Miss => None,
        }
    }

    /// Maps the value while keeping its freshness.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Fresh(value) => Lookup::Fresh(f(value)),
            Self::Stale(value) => Lookup::Stale(f(value)),
            Self::Miss => Lookup::Miss,
        }
    }
}

/// A two-tier key/value store with per-entry freshness.
///
/// Reads check the bounded in-process tier first, then the durable tier. A durable hit
/// is copied back into the in-process tier. Entries are classified against the window
/// they were written with; expired entries are deleted from both tiers and reported
/// as a miss.
///
/// Durable-tier failures never reach the caller. They are logged at WARN, recorded as
/// a `cache.error` activity, and the in-process tier stays authoritative. When a durable
/// write or removal fails, the key's durable record is no longer trusted: it is never
/// served again, and its removal is retried on later reads until it succeeds or the
/// key is written again.
///
/// # Examples
///
/// ```
/// use ridecache::{CacheStore, FreshnessPolicy, Lookup, Overrides};
/// use std::time::Duration;
/// use tick::ClockControl;
/// # futures::executor::block_on(async {
///
/// let control = ClockControl::new();
/// let store = CacheStore::builder::<String>(control.to_clock()).build();
/// let policy = FreshnessPolicy::RIDE_LISTINGS;
///
/// store.set("ride:1", "Campus -> Downtown".to_string(), &policy, Overrides::new()).await;
/// assert!(store.get("ride:1", &policy, Overrides::new()).await.is_fresh());
///
/// control.advance(Duration::from_secs(200));
/// assert!(store.get("ride:1", &policy, Overrides::new()).await.is_stale());
///
/// control.advance(Duration::from_secs(3_600));
/// assert_eq!(store.get("ride:1", &policy, Overrides::new()).await, Lookup::Miss);
/// # });
/// ```
#[derive(Debug)]
pub struct CacheStore<V, D = NoopTier> {
    name: CacheName,
    memory: InMemoryTier<String, V>,
    durable: D,
    clock: Clock,
    telemetry: Option<CacheTelemetry>,
    // Keys whose durable record may be older than the last write or delete.
    untrusted: Mutex<HashSet<String>>,
}

impl CacheStore<(), NoopTier> {
    /// Creates a new store builder.
    ///
    /// ```
    /// use ridecache::CacheStore;
    /// use tick::Clock;
    ///
    /// let store = CacheStore::builder::<u32>(Clock::new_frozen())
    ///     .memory_capacity(250)
    ///     .build();
    /// assert_eq!(store.memory_capacity(), 250);
    /// ```
    #[must_use]
    pub fn builder<V>(clock: Clock) -> CacheStoreBuilder<V> {
        CacheStoreBuilder::new(clock)
    }
}

impl<V, D> CacheStore<V, D> {
    pub(crate) fn new(
        name: CacheName,
        memory: InMemoryTier<String, V>,
        durable: D,
        clock: Clock,
        telemetry: Option<CacheTelemetry>,
    ) -> Self {
        Self {
            name,
            memory,
            durable,
            clock,
            telemetry,
            untrusted: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the name of this store for telemetry identification.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.name
    }

    /// Returns the clock used for write timestamps and freshness checks.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the entry bound of the in-process tier.
    #[must_use]
    pub fn memory_capacity(&self) -> usize {
        self.memory.max_entries()
    }

    /// Returns the number of entries in the in-process tier.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memory.entry_count()
    }

    /// Returns true if the in-process tier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the durable tier.
    #[must_use]
    pub fn durable(&self) -> &D {
        &self.durable
    }

    pub(crate) fn telemetry(&self) -> &Option<CacheTelemetry> {
        &self.telemetry
    }
}

impl<V, D> CacheStore<V, D>
where
    V: Clone + Send + Sync,
    D: CacheTier<String, V>,
{
    /// Reads the entry for `key` in the category described by `policy`.
    ///
    /// `overrides` replace the durations the entry was written with.
    pub async fn get(&self, key: &str, policy: &FreshnessPolicy, overrides: Overrides) -> Lookup<V> {
        let cache_key = policy.cache_key(key);
        let timed = self.clock.timed_async(self.lookup(&cache_key, overrides)).await;
        let (lookup, activity) = timed.result;

        self.telemetry
            .record(self.name, CacheOperation::Get, activity, Some(cache_key.as_str()), timed.duration);
        lookup
    }

    /// Writes `value` for `key`, stamped with the current time.
    ///
    /// The in-process tier is written first; the durable write is best-effort. If it
    /// fails, the previous durable record for `key` is removed so it cannot resurface
    /// once the in-process entry is evicted.
    pub async fn set(&self, key: &str, value: V, policy: &FreshnessPolicy, overrides: Overrides) {
        let cache_key = policy.cache_key(key);
        let entry = CacheEntry::new(value, self.clock.system_time(), policy.window(overrides));

        let timed = self
            .clock
            .timed_async(async {
                if let Err(e) = self.memory.insert(&cache_key, entry.clone()).await {
                    tracing::warn!(cache.name = self.name, cache.key = %cache_key, error = %e, "in-process write failed");
                }
                self.durable.insert(&cache_key, entry).await
            })
            .await;

        let activity = match timed.result {
            Ok(()) => {
                self.untrusted.lock().remove(&cache_key);
                CacheActivity::Inserted
            }
            Err(e) => {
                tracing::warn!(cache.name = self.name, cache.key = %cache_key, error = %e, "durable write failed");
                self.discard_durable(&cache_key).await;
                CacheActivity::Error
            }
        };

        self.telemetry
            .record(self.name, CacheOperation::Set, activity, Some(cache_key.as_str()), timed.duration);
        self.telemetry.record_size(self.name, self.len() as u64);
    }

    /// Removes the entry for `key` from both tiers. Removing an absent key is a no-op.
    pub async fn delete(&self, key: &str, policy: &FreshnessPolicy) {
        let cache_key = policy.cache_key(key);
        let timed = self.clock.timed_async(self.purge(&cache_key)).await;

        let activity = if timed.result {
            CacheActivity::Deleted
        } else {
            CacheActivity::Error
        };
        self.telemetry
            .record(self.name, CacheOperation::Delete, activity, Some(cache_key.as_str()), timed.duration);
        self.telemetry.record_size(self.name, self.len() as u64);
    }

    /// Removes every entry this store owns from both tiers.
    pub async fn clear(&self) {
        let timed = self
            .clock
            .timed_async(async {
                if let Err(e) = self.memory.clear().await {
                    tracing::warn!(cache.name = self.name, error = %e, "in-process clear failed");
                }
                self.durable.clear().await
            })
            .await;

        let activity = match timed.result {
            Ok(()) => {
                self.untrusted.lock().clear();
                CacheActivity::Ok
            }
            Err(e) => {
                tracing::warn!(cache.name = self.name, error = %e, "durable clear failed");
                CacheActivity::Error
            }
        };

        self.telemetry
            .record(self.name, CacheOperation::Clear, activity, None, timed.duration);
        self.telemetry.record_size(self.name, self.len() as u64);
    }

    async fn lookup(&self, cache_key: &String, overrides: Overrides) -> (Lookup<V>, CacheActivity) {
        let (entry, from_durable) = match self.memory.get(cache_key).await {
            Ok(Some(entry)) => (entry, false),
            _ if self.is_untrusted(cache_key) => {
                self.discard_durable(cache_key).await;
                return (Lookup::Miss, CacheActivity::Miss);
            }
            _ => match self.read_durable(cache_key).await {
                Some(entry) => (entry, true),
                None => return (Lookup::Miss, CacheActivity::Miss),
            },
        };

        let window = entry
            .window()
            .with_overrides(overrides.max_age(), overrides.stale_while_revalidate());

        match entry.freshness_with(self.clock.system_time(), window) {
            Freshness::Expired => {
                self.purge(cache_key).await;
                (Lookup::Miss, CacheActivity::Expired)
            }
            freshness => {
                if from_durable {
                    self.promote(cache_key, entry.clone()).await;
                }

                let value = entry.into_value();
                if freshness == Freshness::Fresh {
                    (Lookup::Fresh(value), CacheActivity::Fresh)
                } else {
                    (Lookup::Stale(value), CacheActivity::Stale)
                }
            }
        }
    }

    async fn read_durable(&self, cache_key: &String) -> Option<CacheEntry<V>> {
        match self.durable.get(cache_key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(cache.name = self.name, cache.key = %cache_key, error = %e, "durable read failed, treating as miss");
                self.telemetry
                    .record(self.name, CacheOperation::Get, CacheActivity::Error, Some(cache_key.as_str()), std::time::Duration::ZERO);

                // Undecodable records would fail every future read as well.
                if e.is_corrupt() {
                    self.discard_durable(cache_key).await;
                }
                None
            }
        }
    }

    async fn promote(&self, cache_key: &String, entry: CacheEntry<V>) {
        let timed = self.clock.timed_async(self.memory.insert(cache_key, entry)).await;
        let activity = match timed.result {
            Ok(()) => CacheActivity::Promoted,
            Err(_) => CacheActivity::Error,
        };
        self.telemetry
            .record(self.name, CacheOperation::Set, activity, Some(cache_key.as_str()), timed.duration);
    }

    /// Removes `cache_key` from both tiers. Returns false if the durable removal failed.
    async fn purge(&self, cache_key: &String) -> bool {
        if let Err(e) = self.memory.invalidate(cache_key).await {
            tracing::warn!(cache.name = self.name, cache.key = %cache_key, error = %e, "in-process delete failed");
        }

        self.discard_durable(cache_key).await
    }

    /// Removes the durable record for `cache_key`.
    ///
    /// On failure the key is marked untrusted, so reads skip its durable record and
    /// retry the removal instead.
    async fn discard_durable(&self, cache_key: &String) -> bool {
        match self.durable.invalidate(cache_key).await {
            Ok(()) => {
                self.untrusted.lock().remove(cache_key);
                true
            }
            Err(e) => {
                tracing::warn!(cache.name = self.name, cache.key = %cache_key, error = %e, "durable delete failed");
                self.untrusted.lock().insert(cache_key.clone());
                false
            }
        }
    }

    fn is_untrusted(&self, cache_key: &String) -> bool {
        self.untrusted.lock().contains(cache_key)
    }
}
