// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stale-while-revalidate resolution.

use std::{
    collections::HashSet,
    fmt::{self, Debug, Display},
    sync::Arc,
    time::Duration,
};

use parking_lot::Mutex;
use ridecache_tier::{CacheTier, NoopTier};

use crate::{
    policy::{FreshnessPolicy, Overrides},
    runtime::Runtime,
    store::{CacheStore, Lookup},
    telemetry::{
        CacheActivity, CacheOperation,
        ext::{CacheTelemetryExt, ClockExt},
    },
};

/// Per-call options for [`Revalidator::resolve`].
///
/// ```
/// use ridecache::ResolveOptions;
/// use std::time::Duration;
///
/// let options = ResolveOptions::new()
///     .with_max_age(Duration::from_secs(180))
///     .with_force_refresh(true);
/// assert!(options.is_force_refresh());
/// assert_eq!(options.overrides().max_age(), Some(Duration::from_secs(180)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    overrides: Overrides,
    force_refresh: bool,
}

impl ResolveOptions {
    /// Creates options that use the policy defaults and consult the cache first.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            overrides: Overrides::new(),
            force_refresh: false,
        }
    }

    /// Replaces the policy's `max_age`.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.overrides = self.overrides.with_max_age(max_age);
        self
    }

    /// Replaces the policy's `stale_while_revalidate`.
    #[must_use]
    pub const fn with_stale_while_revalidate(mut self, stale_while_revalidate: Duration) -> Self {
        self.overrides = self.overrides.with_stale_while_revalidate(stale_while_revalidate);
        self
    }

    /// Replaces all overrides at once.
    #[must_use]
    pub const fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Skips the cache read and always fetches.
    #[must_use]
    pub const fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Returns the duration overrides.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    /// Returns true if the cache read is skipped.
    #[must_use]
    pub fn is_force_refresh(&self) -> bool {
        self.force_refresh
    }
}

/// Serves cached data immediately and keeps it fresh in the background.
///
/// - A fresh entry is returned without fetching.
/// - A stale entry is returned at once while the fetch runs on a background task and
///   writes its result back. A failed background fetch is logged at DEBUG and dropped.
/// - Otherwise the fetch is awaited. If it fails, a usable cached value is returned
///   instead; with nothing cached, the fetch error is returned unchanged.
///
/// Background fetches are coalesced per key: while one is running, further stale reads
/// of that key do not start another. Awaited fetches are never coalesced.
///
/// Background work is spawned on the tokio runtime current when `resolve` runs. Without
/// one the stale value is still served but never refreshed: it keeps being returned
/// until it expires, and each skipped refresh is logged at WARN. Call `resolve` from
/// inside a runtime whenever stale reads are expected.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use ridecache::{CacheStore, FreshnessPolicy, ResolveOptions, Revalidator};
/// use tick::ClockControl;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let control = ClockControl::new();
/// let revalidator = Revalidator::new(Arc::new(CacheStore::builder::<u32>(control.to_clock()).build()));
/// let policy = FreshnessPolicy::USER_PROFILE;
/// let fetch = |n: u32| move || async move { Ok::<_, String>(n) };
///
/// assert_eq!(revalidator.resolve("u1", fetch(1), &policy, ResolveOptions::new()).await, Ok(1));
///
/// // Past max_age: the stale value comes back while `fetch(2)` runs on the runtime.
/// control.advance(Duration::from_secs(400));
/// assert_eq!(revalidator.resolve("u1", fetch(2), &policy, ResolveOptions::new()).await, Ok(1));
///
/// while revalidator.is_revalidating("u1", &policy) {
///     tokio::task::yield_now().await;
/// }
/// assert_eq!(revalidator.resolve("u1", fetch(3), &policy, ResolveOptions::new()).await, Ok(2));
/// # }
/// ```
pub struct Revalidator<V, D = NoopTier> {
    store: Arc<CacheStore<V, D>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    runtime: Runtime,
}

impl<V, D> Clone for Revalidator<V, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            in_flight: Arc::clone(&self.in_flight),
            runtime: self.runtime,
        }
    }
}

impl<V, D> Debug for Revalidator<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revalidator")
            .field("in_flight", &self.in_flight.lock().len())
            .finish_non_exhaustive()
    }
}

impl<V, D> Revalidator<V, D> {
    /// Creates a revalidator over a shared store.
    #[must_use]
    pub fn new(store: Arc<CacheStore<V, D>>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            runtime: Runtime,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<CacheStore<V, D>> {
        &self.store
    }

    /// Returns true while a background revalidation for `key` is running.
    #[must_use]
    pub fn is_revalidating(&self, key: &str, policy: &FreshnessPolicy) -> bool {
        self.in_flight.lock().contains(&policy.cache_key(key))
    }
}

impl<V, D> Revalidator<V, D>
where
    V: Clone + Send + Sync + 'static,
    D: CacheTier<String, V> + 'static,
{
    /// Returns data for `key`, fetching it with `fetch` when the cache cannot answer.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the fetch fails and nothing usable is cached.
    pub async fn resolve<F, Fut, E>(&self, key: &str, fetch: F, policy: &FreshnessPolicy, options: ResolveOptions) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let overrides = options.overrides();

        if !options.is_force_refresh() {
            match self.store.get(key, policy, overrides).await {
                Lookup::Fresh(value) => return Ok(value),
                Lookup::Stale(value) => {
                    self.revalidate_in_background(key, fetch, policy, overrides);
                    return Ok(value);
                }
                Lookup::Miss => {}
            }
        }

        match fetch().await {
            Ok(value) => {
                self.store.set(key, value.clone(), policy, overrides).await;
                Ok(value)
            }
            Err(error) => {
                let timed = self.store.clock().timed_async(self.store.get(key, policy, overrides)).await;
                let Some(value) = timed.result.into_value() else {
                    return Err(error);
                };

                let cache_key = policy.cache_key(key);
                tracing::debug!(cache.name = self.store.name(), cache.key = %cache_key, %error, "fetch failed, serving cached value");
                self.store.telemetry().record(
                    self.store.name(),
                    CacheOperation::Revalidate,
                    CacheActivity::Fallback,
                    Some(cache_key.as_str()),
                    timed.duration,
                );
                Ok(value)
            }
        }
    }

    fn revalidate_in_background<F, Fut, E>(&self, key: &str, fetch: F, policy: &FreshnessPolicy, overrides: Overrides)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let cache_key = policy.cache_key(key);
        let Some(guard) = InFlight::acquire(&self.in_flight, cache_key.clone()) else {
            return;
        };

        let store = Arc::clone(&self.store);
        let key = key.to_owned();
        let policy = policy.clone();

        let spawned = self.runtime.spawn(async move {
            let timed = store.clock().timed_async(fetch()).await;
            let activity = match timed.result {
                Ok(value) => {
                    store.set(&key, value, &policy, overrides).await;
                    CacheActivity::Refreshed
                }
                Err(error) => {
                    tracing::debug!(cache.name = store.name(), cache.key = %guard.key, %error, "background revalidation failed");
                    CacheActivity::RefreshFailed
                }
            };

            store.telemetry().record(
                store.name(),
                CacheOperation::Revalidate,
                activity,
                Some(guard.key.as_str()),
                timed.duration,
            );
        });

        if !spawned {
            tracing::warn!(
                cache.name = self.store.name(),
                cache.key = %cache_key,
                "no tokio runtime available, skipping background revalidation"
            );
        }
    }
}

/// Marks a key as being revalidated until dropped.
struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlight {
    fn acquire(keys: &Arc<Mutex<HashSet<String>>>, key: String) -> Option<Self> {
        keys.lock().insert(key.clone()).then(|| Self {
            keys: Arc::clone(keys),
            key,
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}
