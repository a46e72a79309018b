// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process tier with insertion-order eviction.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use foldhash::fast::RandomState;
use parking_lot::Mutex;
use ridecache_tier::{CacheEntry, CacheTier, Error};

use crate::builder::InMemoryTierBuilder;

/// A bounded in-process cache tier.
///
/// Entries are kept in insertion order. Writing a key that is not yet present
/// into a full tier evicts exactly one entry: the oldest insertion. Overwriting
/// an existing key evicts nothing and moves that key to the newest position.
///
/// The map and its ordering live behind one mutex, so `get`, `insert`, and
/// `invalidate` are atomic with respect to each other. Clones share state.
///
/// # Examples
///
/// ```
/// use ridecache_memory::InMemoryTier;
/// use ridecache_tier::CacheTier;
///
/// let tier = InMemoryTier::<String, i32>::new();
/// assert_eq!(tier.len(), Some(0));
/// ```
#[derive(Debug)]
pub struct InMemoryTier<K, V> {
    state: Arc<Mutex<State<K, V>>>,
    max_entries: usize,
}

#[derive(Debug)]
struct State<K, V> {
    entries: HashMap<K, Slot<V>, RandomState>,
    order: BTreeMap<u64, K>,
    next_seq: u64,
    evictions: u64,
}

#[derive(Debug)]
struct Slot<V> {
    seq: u64,
    entry: CacheEntry<V>,
}

impl<K, V> Clone for InMemoryTier<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            max_entries: self.max_entries,
        }
    }
}

impl<K, V> Default for InMemoryTier<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryTier<K, V>
where
    K: Hash + Eq,
{
    /// Creates a tier with the default bound.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a tier holding at most `max_entries` entries.
    #[must_use]
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self::builder().max_entries(max_entries).build()
    }

    /// Creates a new builder for configuring an in-process tier.
    #[must_use]
    pub fn builder() -> InMemoryTierBuilder<K, V> {
        InMemoryTierBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryTierBuilder<K, V>) -> Self {
        let capacity = builder.initial_capacity.unwrap_or(0).min(builder.max_entries);
        Self {
            state: Arc::new(Mutex::new(State {
                entries: HashMap::with_capacity_and_hasher(capacity, RandomState::default()),
                order: BTreeMap::new(),
                next_seq: 0,
                evictions: 0,
            })),
            max_entries: builder.max_entries,
        }
    }

    /// Returns the entry bound of this tier.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Returns how many entries have been evicted to respect the bound.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.state.lock().evictions
    }

    /// Returns the number of entries currently held.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if the tier holds the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.state.lock().entries.contains_key(key)
    }
}

impl<K, V> InMemoryTier<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Returns the keys currently held, oldest insertion first.
    #[must_use]
    pub fn keys_oldest_first(&self) -> Vec<K> {
        self.state.lock().order.values().cloned().collect()
    }
}

impl<K, V> State<K, V>
where
    K: Hash + Eq + Clone,
{
    fn insert(&mut self, key: &K, entry: CacheEntry<V>, max_entries: usize) {
        if let Some(previous) = self.entries.remove(key) {
            self.order.remove(&previous.seq);
        } else if self.entries.len() >= max_entries
            && let Some((_, oldest)) = self.order.pop_first()
        {
            self.entries.remove(&oldest);
            self.evictions += 1;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(key.clone(), Slot { seq, entry });
    }

    fn remove(&mut self, key: &K) {
        if let Some(slot) = self.entries.remove(key) {
            self.order.remove(&slot.seq);
        }
    }
}

impl<K, V> CacheTier<K, V> for InMemoryTier<K, V>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        Ok(self.state.lock().entries.get(key).map(|slot| slot.entry.clone()))
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
        self.state.lock().insert(key, entry, self.max_entries);
        Ok(())
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        self.state.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.state.lock().entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use ridecache_tier::FreshnessWindow;

    use super::*;

    fn entry(value: i32) -> CacheEntry<i32> {
        CacheEntry::new(
            value,
            SystemTime::UNIX_EPOCH,
            FreshnessWindow::new(Duration::from_secs(60), Duration::from_secs(600)),
        )
    }

    #[test]
    fn order_and_entries_stay_in_step() {
        let mut state = State {
            entries: HashMap::with_hasher(RandomState::default()),
            order: BTreeMap::new(),
            next_seq: 0,
            evictions: 0,
        };

        state.insert(&"a", entry(1), 2);
        state.insert(&"b", entry(2), 2);
        state.insert(&"a", entry(3), 2);
        state.insert(&"c", entry(4), 2);
        state.remove(&"missing");

        assert_eq!(state.entries.len(), state.order.len());
        assert_eq!(state.order.values().copied().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(state.evictions, 1);
    }

    #[test]
    fn zero_bound_is_raised_to_one() {
        let tier = InMemoryTier::<String, i32>::with_max_entries(0);
        assert_eq!(tier.max_entries(), 1);
    }
}
