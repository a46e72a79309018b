// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ridecache_tier::{CacheEntry, FreshnessWindow};
use serde::{Deserialize, Serialize};

/// On-disk shape of a cache entry. Times are whole milliseconds.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedRecord<T> {
    pub data: T,
    pub timestamp_ms: u64,
    pub max_age_ms: u64,
    pub stale_while_revalidate_ms: u64,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<'a, V> PersistedRecord<&'a V> {
    pub fn borrowed(entry: &'a CacheEntry<V>) -> Self {
        let window = entry.window();
        Self {
            data: entry.value(),
            // Pre-epoch write times clamp to the epoch.
            timestamp_ms: millis(entry.cached_at().duration_since(UNIX_EPOCH).unwrap_or_default()),
            max_age_ms: millis(window.max_age()),
            stale_while_revalidate_ms: millis(window.stale_while_revalidate()),
        }
    }
}

impl<V> PersistedRecord<V> {
    pub fn into_entry(self) -> CacheEntry<V> {
        let cached_at = UNIX_EPOCH
            .checked_add(Duration::from_millis(self.timestamp_ms))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let window = FreshnessWindow::new(
            Duration::from_millis(self.max_age_ms),
            Duration::from_millis(self.stale_while_revalidate_ms),
        );
        CacheEntry::new(self.data, cached_at, window)
    }
}
