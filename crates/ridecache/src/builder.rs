// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`CacheStore`].

use std::marker::PhantomData;

use ridecache_memory::InMemoryTier;
use ridecache_memory::builder::DEFAULT_MAX_ENTRIES;
use ridecache_tier::NoopTier;
use tick::Clock;

use crate::store::{CacheName, CacheStore, DEFAULT_CACHE_NAME};
use crate::telemetry::CacheTelemetry;

/// Configures and builds a [`CacheStore`].
///
/// Created by [`CacheStore::builder`]. Without a durable tier the store runs purely
/// in process.
///
/// # Examples
///
/// ```
/// use ridecache::CacheStore;
/// use ridecache_durable::{DurableTier, MemoryKeyValueStore};
/// use tick::Clock;
///
/// let store = CacheStore::builder::<String>(Clock::new_frozen())
///     .name("carpool")
///     .memory_capacity(50)
///     .durable(DurableTier::new(MemoryKeyValueStore::new()))
///     .build();
///
/// assert_eq!(store.memory_capacity(), 50);
/// assert_eq!(store.durable().namespace_prefix(), "ridecache:");
/// ```
#[derive(Debug)]
pub struct CacheStoreBuilder<V, D = NoopTier> {
    clock: Clock,
    name: CacheName,
    memory_capacity: usize,
    durable: D,
    telemetry: Option<CacheTelemetry>,
    _value: PhantomData<fn() -> V>,
}

impl<V> CacheStoreBuilder<V> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            clock,
            name: DEFAULT_CACHE_NAME,
            memory_capacity: DEFAULT_MAX_ENTRIES,
            durable: NoopTier,
            telemetry: None,
            _value: PhantomData,
        }
    }
}

impl<V, D> CacheStoreBuilder<V, D> {
    /// Sets the name reported in telemetry.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = name;
        self
    }

    /// Sets how many entries the in-process tier holds before evicting the oldest.
    #[must_use]
    pub fn memory_capacity(mut self, entries: usize) -> Self {
        self.memory_capacity = entries;
        self
    }

    /// Enables telemetry for this store.
    #[must_use]
    pub fn telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Adds a durable tier behind the in-process tier.
    #[must_use]
    pub fn durable<D2>(self, durable: D2) -> CacheStoreBuilder<V, D2> {
        CacheStoreBuilder {
            clock: self.clock,
            name: self.name,
            memory_capacity: self.memory_capacity,
            durable,
            telemetry: self.telemetry,
            _value: PhantomData,
        }
    }

    /// Returns a reference to the builder's clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Builds the store.
    #[must_use]
    pub fn build(self) -> CacheStore<V, D> {
        let memory = InMemoryTier::<String, V>::builder().max_entries(self.memory_capacity).build();
        CacheStore::new(self.name, memory, self.durable, self.clock, self.telemetry)
    }
}
