// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cached access to carpool marketplace data.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::Duration;

use ridecache_tier::{CacheTier, NoopTier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::invalidation::Invalidation;
use crate::keys::{self, RideFilters};
use crate::policy::{FreshnessPolicy, Overrides};
use crate::revalidate::{ResolveOptions, Revalidator};
use crate::store::CacheStore;

const LISTINGS_WINDOW: Overrides = Overrides::window(Duration::from_secs(120), Duration::from_secs(3_600));
const RIDE_WINDOW: Overrides = Overrides::window(Duration::from_secs(300), Duration::from_secs(1_800));
const PROFILE_WINDOW: Overrides = Overrides::window(Duration::from_secs(300), Duration::from_secs(1_800));
const USER_RIDES_WINDOW: Overrides = Overrides::window(Duration::from_secs(180), Duration::from_secs(1_800));
const TRANSACTIONS_WINDOW: Overrides = Overrides::window(Duration::from_secs(120), Duration::from_secs(1_800));

/// A posted ride.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    /// Ride identifier.
    pub id: String,
    /// Profile id of the driver.
    pub driver_id: String,
    /// Pickup location.
    pub from: String,
    /// Drop-off location.
    pub to: String,
    /// Departure time as an RFC 3339 string.
    pub departure: String,
    /// Seats still free.
    pub seats_available: u8,
    /// Price per seat.
    pub price_cents: u32,
}

/// A student's public profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: String,
    /// Name shown to other riders.
    pub display_name: String,
    /// Enrolled university, if shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    /// Whether the student email was confirmed.
    #[serde(default)]
    pub verified: bool,
}

/// A wallet movement. Positive amounts are credits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction identifier.
    pub id: String,
    /// Owner of the wallet.
    pub user_id: String,
    /// Signed amount.
    pub amount_cents: i64,
    /// Text shown in the wallet history.
    pub description: String,
    /// Booking time as an RFC 3339 string.
    pub created_at: String,
}

/// Everything the carpool cache stores, tagged by kind.
///
/// One store holds all categories, so each entry records which shape it has.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedPayload {
    /// A ride search result or a user's ride history.
    Rides(Vec<Ride>),
    /// A single ride.
    Ride(Ride),
    /// A user profile.
    Profile(UserProfile),
    /// A user's wallet history.
    Transactions(Vec<Transaction>),
    /// A generic endpoint response.
    Json(Value),
}

impl CachedPayload {
    /// Returns the serialized tag of this payload.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rides(_) => "rides",
            Self::Ride(_) => "ride",
            Self::Profile(_) => "profile",
            Self::Transactions(_) => "transactions",
            Self::Json(_) => "json",
        }
    }

    /// Returns the ride list, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns the payload unchanged when it is not [`CachedPayload::Rides`].
    pub fn into_rides(self) -> Result<Vec<Ride>, Self> {
        match self {
            Self::Rides(rides) => Ok(rides),
            other => Err(other),
        }
    }

    /// Returns the ride, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns the payload unchanged when it is not [`CachedPayload::Ride`].
    pub fn into_ride(self) -> Result<Ride, Self> {
        match self {
            Self::Ride(ride) => Ok(ride),
            other => Err(other),
        }
    }

    /// Returns the profile, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns the payload unchanged when it is not [`CachedPayload::Profile`].
    pub fn into_profile(self) -> Result<UserProfile, Self> {
        match self {
            Self::Profile(profile) => Ok(profile),
            other => Err(other),
        }
    }

    /// Returns the transactions, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns the payload unchanged when it is not [`CachedPayload::Transactions`].
    pub fn into_transactions(self) -> Result<Vec<Transaction>, Self> {
        match self {
            Self::Transactions(transactions) => Ok(transactions),
            other => Err(other),
        }
    }

    /// Returns the JSON document, or `self` if this is another kind.
    ///
    /// # Errors
    ///
    /// Returns the payload unchanged when it is not [`CachedPayload::Json`].
    pub fn into_json(self) -> Result<Value, Self> {
        match self {
            Self::Json(value) => Ok(value),
            other => Err(other),
        }
    }
}

/// The carpool backend reached when the cache cannot answer.
///
/// Implementations are typically HTTP clients; tests and demos use in-process fakes.
pub trait CarpoolBackend: Send + Sync + 'static {
    /// Error returned by every fetch.
    type Error: Display + Send + 'static;

    /// Searches rides matching `filters`.
    fn ride_listings(&self, filters: &RideFilters) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send;

    /// Loads a single ride.
    fn ride(&self, ride_id: &str) -> impl Future<Output = Result<Ride, Self::Error>> + Send;

    /// Loads a user's profile.
    fn user_profile(&self, user_id: &str) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send;

    /// Loads the rides a user posted or joined.
    fn user_rides(&self, user_id: &str) -> impl Future<Output = Result<Vec<Ride>, Self::Error>> + Send;

    /// Loads a user's wallet transactions.
    fn user_transactions(&self, user_id: &str) -> impl Future<Output = Result<Vec<Transaction>, Self::Error>> + Send;
}

/// Cached, stale-while-revalidate access to carpool data.
///
/// Each function binds a logical key, a backend call, and a freshness policy:
///
/// | function | policy | fresh for | served stale for |
/// |---|---|---|---|
/// | [`ride_listings`](Self::ride_listings) | [`RIDE_LISTINGS`](FreshnessPolicy::RIDE_LISTINGS) | 2 min | 1 h |
/// | [`ride`](Self::ride) | [`RIDE_LISTINGS`](FreshnessPolicy::RIDE_LISTINGS) | 5 min | 30 min |
/// | [`user_profile`](Self::user_profile) | [`USER_PROFILE`](FreshnessPolicy::USER_PROFILE) | 5 min | 30 min |
/// | [`user_rides`](Self::user_rides) | [`USER_PROFILE`](FreshnessPolicy::USER_PROFILE) | 3 min | 30 min |
/// | [`user_transactions`](Self::user_transactions) | [`USER_PROFILE`](FreshnessPolicy::USER_PROFILE) | 2 min | 30 min |
/// | [`api_response`](Self::api_response) | [`API_RESPONSES`](FreshnessPolicy::API_RESPONSES) | 5 min | 30 min |
///
/// A cached payload of the wrong kind for its key is discarded and fetched again.
pub struct CarpoolData<B, D = NoopTier> {
    backend: Arc<B>,
    revalidator: Revalidator<CachedPayload, D>,
    invalidation: Invalidation<CachedPayload, D>,
}

impl<B, D> Clone for CarpoolData<B, D> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            revalidator: self.revalidator.clone(),
            invalidation: self.invalidation.clone(),
        }
    }
}

impl<B, D> Debug for CarpoolData<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarpoolData")
            .field("revalidator", &self.revalidator)
            .field("invalidation", &self.invalidation)
            .finish_non_exhaustive()
    }
}

impl<B, D> CarpoolData<B, D> {
    /// Creates a facade over `backend`, caching into `store`.
    #[must_use]
    pub fn new(backend: B, store: Arc<CacheStore<CachedPayload, D>>) -> Self {
        Self {
            backend: Arc::new(backend),
            revalidator: Revalidator::new(Arc::clone(&store)),
            invalidation: Invalidation::new(store),
        }
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<CacheStore<CachedPayload, D>> {
        self.revalidator.store()
    }

    /// Returns the revalidator used by every facade function.
    #[must_use]
    pub fn revalidator(&self) -> &Revalidator<CachedPayload, D> {
        &self.revalidator
    }

    /// Returns the invalidation handle for the same store.
    #[must_use]
    pub fn invalidation(&self) -> &Invalidation<CachedPayload, D> {
        &self.invalidation
    }
}

impl<B, D> CarpoolData<B, D>
where
    B: CarpoolBackend,
    D: CacheTier<String, CachedPayload> + 'static,
{
    /// Returns rides matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the fetch fails and nothing usable is cached.
    pub async fn ride_listings(&self, filters: &RideFilters) -> Result<Vec<Ride>, B::Error> {
        let backend = Arc::clone(&self.backend);
        let owned = filters.clone();
        let fetch = move || {
            let backend = Arc::clone(&backend);
            let filters = owned.clone();
            async move { backend.ride_listings(&filters).await }
        };

        self.load(
            &keys::ride_listings(filters),
            &FreshnessPolicy::RIDE_LISTINGS,
            LISTINGS_WINDOW,
            fetch,
            CachedPayload::Rides,
            CachedPayload::into_rides,
        )
        .await
    }

    /// Returns a single ride.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the fetch fails and nothing usable is cached.
    pub async fn ride(&self, ride_id: &str) -> Result<Ride, B::Error> {
        let fetch = self.fetcher(ride_id, |backend, id| async move { backend.ride(&id).await });
        self.load(
            &keys::ride(ride_id),
            &FreshnessPolicy::RIDE_LISTINGS,
            RIDE_WINDOW,
            fetch,
            CachedPayload::Ride,
            CachedPayload::into_ride,
        )
        .await
    }

    /// Returns a user's profile.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the fetch fails and nothing usable is cached.
    pub async fn user_profile(&self, user_id: &str) -> Result<UserProfile, B::Error> {
        let fetch = self.fetcher(user_id, |backend, id| async move { backend.user_profile(&id).await });
        self.load(
            &keys::user_profile(user_id),
            &FreshnessPolicy::USER_PROFILE,
            PROFILE_WINDOW,
            fetch,
            CachedPayload::Profile,
            CachedPayload::into_profile,
        )
        .await
    }

    /// Returns the rides a user posted or joined.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the fetch fails and nothing usable is cached.
    pub async fn user_rides(&self, user_id: &str) -> Result<Vec<Ride>, B::Error> {
        let fetch = self.fetcher(user_id, |backend, id| async move { backend.user_rides(&id).await });
        self.load(
            &keys::user_rides(user_id),
            &FreshnessPolicy::USER_PROFILE,
            USER_RIDES_WINDOW,
            fetch,
            CachedPayload::Rides,
            CachedPayload::into_rides,
        )
        .await
    }

    /// Returns a user's wallet transactions.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the fetch fails and nothing usable is cached.
    pub async fn user_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, B::Error> {
        let fetch = self.fetcher(user_id, |backend, id| async move { backend.user_transactions(&id).await });
        self.load(
            &keys::user_transactions(user_id),
            &FreshnessPolicy::USER_PROFILE,
            TRANSACTIONS_WINDOW,
            fetch,
            CachedPayload::Transactions,
            CachedPayload::into_transactions,
        )
        .await
    }

    /// Returns the response of a generic endpoint, fetched with `fetch` when needed.
    ///
    /// `fetch` may be called twice if the cached entry turns out to hold another kind
    /// of payload.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the fetch fails and nothing usable is cached.
    pub async fn api_response<F, Fut, E>(&self, endpoint: &str, fetch: F) -> Result<Value, E>
    where
        F: Fn() -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.load(
            endpoint,
            &FreshnessPolicy::API_RESPONSES,
            Overrides::new(),
            fetch,
            CachedPayload::Json,
            CachedPayload::into_json,
        )
        .await
    }

    /// Builds a repeatable fetch that calls `call` with the backend and an owned id.
    fn fetcher<T, C, Fut>(&self, id: &str, call: C) -> impl Fn() -> Fut + Clone + Send + use<B, D, T, C, Fut>
    where
        C: Fn(Arc<B>, String) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T, B::Error>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let id = id.to_owned();
        move || call(Arc::clone(&backend), id.clone())
    }

    async fn load<T, F, Fut, E>(
        &self,
        key: &str,
        policy: &FreshnessPolicy,
        overrides: Overrides,
        fetch: F,
        wrap: fn(T) -> CachedPayload,
        unwrap: fn(CachedPayload) -> Result<T, CachedPayload>,
    ) -> Result<T, E>
    where
        T: Clone + Send + 'static,
        F: Fn() -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let first = fetch.clone();
        let payload = self
            .revalidator
            .resolve(
                key,
                move || async move { first().await.map(wrap) },
                policy,
                ResolveOptions::new().with_overrides(overrides),
            )
            .await?;

        match unwrap(payload) {
            Ok(value) => Ok(value),
            Err(other) => {
                let store = self.revalidator.store();
                tracing::warn!(
                    cache.name = store.name(),
                    cache.key = %policy.cache_key(key),
                    found = other.kind(),
                    "cached payload has the wrong kind, fetching again"
                );

                store.delete(key, policy).await;
                let value = fetch().await?;
                store.set(key, wrap(value.clone()), policy, overrides).await;
                Ok(value)
            }
        }
    }
}
