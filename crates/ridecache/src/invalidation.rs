// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Explicit purges of cached carpool data.

use std::fmt::{self, Debug};
use std::sync::Arc;

use ridecache_tier::{CacheTier, NoopTier};

use crate::keys;
use crate::policy::FreshnessPolicy;
use crate::store::CacheStore;

/// Removes cached entries after the data behind them changed.
///
/// Every operation only touches the cache; none of them fetch. Purging keys that are
/// not cached is a no-op.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ridecache::{CacheStore, FreshnessPolicy, Invalidation, Overrides, keys};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let store = Arc::new(CacheStore::builder::<String>(Clock::new_frozen()).build());
/// let profile = FreshnessPolicy::USER_PROFILE;
/// store.set(&keys::user_profile("u1"), "Ada".into(), &profile, Overrides::new()).await;
///
/// Invalidation::new(Arc::clone(&store)).invalidate_user("u1").await;
/// assert!(store.get(&keys::user_profile("u1"), &profile, Overrides::new()).await.is_miss());
/// # });
/// ```
pub struct Invalidation<V, D = NoopTier> {
    store: Arc<CacheStore<V, D>>,
}

impl<V, D> Clone for Invalidation<V, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<V, D> Debug for Invalidation<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invalidation").field("store", &self.store.name()).finish()
    }
}

impl<V, D> Invalidation<V, D> {
    /// Creates an invalidation handle over a shared store.
    #[must_use]
    pub fn new(store: Arc<CacheStore<V, D>>) -> Self {
        Self { store }
    }
}

impl<V, D> Invalidation<V, D>
where
    V: Clone + Send + Sync,
    D: CacheTier<String, V>,
{
    /// Purges a user's profile, ride history, and transactions.
    pub async fn invalidate_user(&self, user_id: &str) {
        let policy = FreshnessPolicy::USER_PROFILE;
        tracing::debug!(cache.name = self.store.name(), user_id, "invalidating user data");

        self.store.delete(&keys::user_profile(user_id), &policy).await;
        self.store.delete(&keys::user_rides(user_id), &policy).await;
        self.store.delete(&keys::user_transactions(user_id), &policy).await;
    }

    /// Purges a single ride and the unfiltered ride listing.
    ///
    /// Filtered listings that contain the ride are left to expire on their own.
    pub async fn invalidate_ride(&self, ride_id: &str) {
        let policy = FreshnessPolicy::RIDE_LISTINGS;
        tracing::debug!(cache.name = self.store.name(), ride_id, "invalidating ride");

        self.store.delete(&keys::ride(ride_id), &policy).await;
        self.store.delete(&keys::all_ride_listings(), &policy).await;
    }

    /// Purges the cached response of a generic endpoint.
    pub async fn invalidate_endpoint(&self, endpoint: &str) {
        self.store.delete(endpoint, &FreshnessPolicy::API_RESPONSES).await;
    }

    /// Purges everything the store holds.
    pub async fn invalidate_all(&self) {
        tracing::debug!(cache.name = self.store.name(), "invalidating all cached data");
        self.store.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use ridecache_tier::testing::{CacheOp, MockCache};
    use tick::ClockControl;

    use super::*;
    use crate::policy::Overrides;

    #[test]
    fn invalidate_ride_purges_ride_and_unfiltered_listing() {
        block_on(async {
            let durable = MockCache::<String, u32>::new();
            let store = Arc::new(
                CacheStore::builder::<u32>(ClockControl::new().to_clock())
                    .durable(durable.clone())
                    .build(),
            );
            let policy = FreshnessPolicy::RIDE_LISTINGS;
            let filtered = keys::ride_listings(&keys::RideFilters::new().to("Airport"));

            store.set(&keys::ride("7"), 1, &policy, Overrides::new()).await;
            store.set(&keys::all_ride_listings(), 2, &policy, Overrides::new()).await;
            store.set(&filtered, 3, &policy, Overrides::new()).await;
            durable.clear_operations();

            Invalidation::new(Arc::clone(&store)).invalidate_ride("7").await;

            assert_eq!(
                durable.operations(),
                vec![
                    CacheOp::Invalidate("rides:ride:7".to_string()),
                    CacheOp::Invalidate("rides:list:{}".to_string()),
                ]
            );
            assert!(store.get(&filtered, &policy, Overrides::new()).await.is_fresh());
            assert_eq!(store.len(), 1);
        });
    }

    #[test]
    fn invalidate_endpoint_uses_api_namespace() {
        block_on(async {
            let store = Arc::new(CacheStore::builder::<u32>(ClockControl::new().to_clock()).build());
            let api = FreshnessPolicy::API_RESPONSES;
            let statics = FreshnessPolicy::STATIC_CONTENT;

            store.set("/campuses", 1, &api, Overrides::new()).await;
            store.set("/campuses", 2, &statics, Overrides::new()).await;

            Invalidation::new(Arc::clone(&store)).invalidate_endpoint("/campuses").await;

            assert!(store.get("/campuses", &api, Overrides::new()).await.is_miss());
            assert!(store.get("/campuses", &statics, Overrides::new()).await.is_fresh());
        });
    }

    #[test]
    fn invalidate_all_clears_both_tiers() {
        block_on(async {
            let durable = MockCache::<String, u32>::new();
            let store = Arc::new(
                CacheStore::builder::<u32>(ClockControl::new().to_clock())
                    .durable(durable.clone())
                    .build(),
            );
            store.set("a", 1, &FreshnessPolicy::STATIC_CONTENT, Overrides::new()).await;

            Invalidation::new(Arc::clone(&store)).invalidate_all().await;

            assert!(store.is_empty());
            assert_eq!(durable.entry_count(), 0);
        });
    }
}
