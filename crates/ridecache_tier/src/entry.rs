// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    ops::Deref,
    time::{Duration, SystemTime},
};

/// How long an entry is served as fresh, and how long after that it is still
/// served while a refresh happens in the background.
///
/// # Examples
///
/// ```
/// use ridecache_tier::FreshnessWindow;
/// use std::time::Duration;
///
/// let window = FreshnessWindow::new(Duration::from_secs(300), Duration::from_secs(1800));
/// assert_eq!(window.lifetime(), Duration::from_secs(2100));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FreshnessWindow {
    max_age: Duration,
    stale_while_revalidate: Duration,
}

impl FreshnessWindow {
    /// Creates a window from a max age and a stale-while-revalidate extension.
    #[must_use]
    pub const fn new(max_age: Duration, stale_while_revalidate: Duration) -> Self {
        Self {
            max_age,
            stale_while_revalidate,
        }
    }

    /// Age after which an entry stops being fresh.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Extra time after `max_age` during which a stale entry is still servable.
    #[must_use]
    pub fn stale_while_revalidate(&self) -> Duration {
        self.stale_while_revalidate
    }

    /// Age at which an entry expires and must never be served again.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.max_age.saturating_add(self.stale_while_revalidate)
    }

    /// Classifies an entry of the given age.
    #[must_use]
    pub fn classify(&self, age: Duration) -> Freshness {
        if age < self.max_age {
            Freshness::Fresh
        } else if age < self.lifetime() {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    /// Returns a copy with the given fields replaced.
    #[must_use]
    pub fn with_overrides(self, max_age: Option<Duration>, stale_while_revalidate: Option<Duration>) -> Self {
        Self {
            max_age: max_age.unwrap_or(self.max_age),
            stale_while_revalidate: stale_while_revalidate.unwrap_or(self.stale_while_revalidate),
        }
    }
}

/// Classification of a cached entry at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// Younger than `max_age`; served without any fetch.
    Fresh,
    /// Past `max_age` but within the stale-while-revalidate extension.
    Stale,
    /// Past `max_age + stale_while_revalidate`; must be purged.
    Expired,
}

impl Freshness {
    /// Returns `true` for entries that may still be returned to a caller.
    #[must_use]
    pub fn is_usable(self) -> bool {
        !matches!(self, Self::Expired)
    }
}

/// A cached value together with the time it was written and its freshness window.
///
/// Entries are replaced wholesale; there is no partial update.
///
/// # Examples
///
/// ```
/// use ridecache_tier::{CacheEntry, FreshnessWindow};
/// use std::time::{Duration, SystemTime};
///
/// let window = FreshnessWindow::new(Duration::from_secs(60), Duration::from_secs(600));
/// let entry = CacheEntry::new(42, SystemTime::UNIX_EPOCH, window);
/// assert_eq!(*entry.value(), 42);
/// assert_eq!(entry.window(), window);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    cached_at: SystemTime,
    window: FreshnessWindow,
}

impl<V> CacheEntry<V> {
    /// Creates an entry written at `cached_at`.
    pub fn new(value: V, cached_at: SystemTime, window: FreshnessWindow) -> Self {
        Self { value, cached_at, window }
    }

    /// Returns the wall-clock time the entry was written.
    #[must_use]
    pub fn cached_at(&self) -> SystemTime {
        self.cached_at
    }

    /// Returns the freshness window the entry was written with.
    #[must_use]
    pub fn window(&self) -> FreshnessWindow {
        self.window
    }

    /// Age of the entry at `now`.
    ///
    /// A write time in the future yields zero, so records written by a clock
    /// ahead of ours read as fresh rather than being discarded.
    #[must_use]
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.cached_at).unwrap_or(Duration::ZERO)
    }

    /// Classifies the entry at `now` against its own window.
    #[must_use]
    pub fn freshness_at(&self, now: SystemTime) -> Freshness {
        self.window.classify(self.age_at(now))
    }

    /// Classifies the entry at `now` against an explicit window.
    #[must_use]
    pub fn freshness_with(&self, now: SystemTime, window: FreshnessWindow) -> Freshness {
        window.classify(self.age_at(now))
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: FreshnessWindow = FreshnessWindow::new(Duration::from_secs(120), Duration::from_secs(3600));

    #[test]
    fn classify_boundaries_are_half_open() {
        assert_eq!(WINDOW.classify(Duration::ZERO), Freshness::Fresh);
        assert_eq!(WINDOW.classify(Duration::from_millis(119_999)), Freshness::Fresh);
        assert_eq!(WINDOW.classify(Duration::from_secs(120)), Freshness::Stale);
        assert_eq!(WINDOW.classify(Duration::from_millis(3_719_999)), Freshness::Stale);
        assert_eq!(WINDOW.classify(Duration::from_secs(3720)), Freshness::Expired);
    }

    #[test]
    fn zero_stale_window_goes_straight_to_expired() {
        let window = FreshnessWindow::new(Duration::from_secs(10), Duration::ZERO);
        assert_eq!(window.classify(Duration::from_secs(9)), Freshness::Fresh);
        assert_eq!(window.classify(Duration::from_secs(10)), Freshness::Expired);
    }

    #[test]
    fn lifetime_saturates() {
        let window = FreshnessWindow::new(Duration::MAX, Duration::from_secs(1));
        assert_eq!(window.lifetime(), Duration::MAX);
    }

    #[test]
    fn future_write_time_reads_as_zero_age() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let entry = CacheEntry::new(1, now + Duration::from_secs(50), WINDOW);
        assert_eq!(entry.age_at(now), Duration::ZERO);
        assert_eq!(entry.freshness_at(now), Freshness::Fresh);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let window = WINDOW.with_overrides(Some(Duration::from_secs(5)), None);
        assert_eq!(window.max_age(), Duration::from_secs(5));
        assert_eq!(window.stale_while_revalidate(), Duration::from_secs(3600));
    }

    #[test]
    fn expired_is_not_usable() {
        assert!(Freshness::Fresh.is_usable());
        assert!(Freshness::Stale.is_usable());
        assert!(!Freshness::Expired.is_usable());
    }
}
