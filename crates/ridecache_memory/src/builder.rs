// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-process tiers.

use std::hash::Hash;
use std::marker::PhantomData;

use crate::tier::InMemoryTier;

/// Default bound on the number of entries held in process.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Builder for configuring an `InMemoryTier`.
///
/// # Examples
///
/// ```
/// use ridecache_memory::InMemoryTier;
///
/// let tier = InMemoryTier::<String, i32>::builder()
///     .max_entries(500)
///     .initial_capacity(64)
///     .build();
/// assert_eq!(tier.max_entries(), 500);
/// ```
#[derive(Debug)]
pub struct InMemoryTierBuilder<K, V> {
    pub(crate) max_entries: usize,
    pub(crate) initial_capacity: Option<usize>,
    _phantom: PhantomData<(K, V)>,
}

impl<K, V> Default for InMemoryTierBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> InMemoryTierBuilder<K, V> {
    /// Creates a new builder bounded at [`DEFAULT_MAX_ENTRIES`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            initial_capacity: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// A bound of zero is raised to one; the tier always holds the latest write.
    #[must_use]
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the tier.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Builds the configured `InMemoryTier`.
    #[must_use]
    pub fn build(self) -> InMemoryTier<K, V>
    where
        K: Hash + Eq,
    {
        InMemoryTier::from_builder(&self)
    }
}
