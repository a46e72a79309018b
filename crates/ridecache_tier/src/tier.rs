// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage tiers.
//!
//! [`CacheTier`] is the storage seam of the cache: the in-process tier and the
//! durable tier both implement it, and the two-tier store composes them.

use crate::{CacheEntry, Error};

/// Trait for cache tier implementations.
///
/// A tier stores entries verbatim. It does not classify freshness; the store
/// layered above it does that with the entry's own timestamp and window.
///
/// All four core methods are required: `get`, `insert`, `invalidate`, and `clear`.
/// Only `len` and `is_empty` have default implementations:
/// - `len`: Returns `None` (not all tiers track size)
/// - `is_empty`: Delegates to `len`
pub trait CacheTier<K, V>: Send + Sync {
    /// Gets an entry, returning an error if the operation fails.
    fn get(&self, key: &K) -> impl Future<Output = Result<Option<CacheEntry<V>>, Error>> + Send;

    /// Inserts an entry, replacing any previous entry for the key.
    fn insert(&self, key: &K, entry: CacheEntry<V>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes an entry. Removing an absent key succeeds.
    fn invalidate(&self, key: &K) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every entry owned by this tier.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the number of entries, if supported.
    ///
    /// Returns `None` for implementations that don't track size.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the tier contains no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}

/// A tier that stores nothing.
///
/// Used in place of a durable tier when a store runs purely in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTier;

impl<K, V> CacheTier<K, V> for NoopTier
where
    K: Sync,
    V: Send,
{
    async fn get(&self, _key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        Ok(None)
    }

    async fn insert(&self, _key: &K, _entry: CacheEntry<V>) -> Result<(), Error> {
        Ok(())
    }

    async fn invalidate(&self, _key: &K) -> Result<(), Error> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(0)
    }
}
