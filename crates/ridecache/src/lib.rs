// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Two-tier stale-while-revalidate caching for the carpool marketplace client.
//!
//! This crate provides:
//! - [`CacheStore`]: a bounded in-process tier backed by an optional durable tier
//! - [`FreshnessPolicy`]: per-category key prefixes, `max_age`, and stale windows
//! - [`Revalidator`]: serves fresh data directly, serves stale data while refreshing
//!   it in the background, and falls back to cached data when a fetch fails
//! - [`Invalidation`]: explicit purges after data changes
//! - [`CarpoolData`]: the category-specific entry points the app calls
//! - Structured `tracing` events and, with the `metrics` feature, OpenTelemetry metrics
//!
//! # Examples
//!
//! ## Stale-while-revalidate
//!
//! ```
//! use std::sync::Arc;
//! use ridecache::{CacheStore, FreshnessPolicy, ResolveOptions, Revalidator};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let store = Arc::new(CacheStore::builder::<Vec<String>>(Clock::new_frozen()).build());
//! let revalidator = Revalidator::new(store);
//!
//! let rides = revalidator
//!     .resolve(
//!         "list:{}",
//!         || async { Ok::<_, String>(vec!["Campus -> Airport".to_string()]) },
//!         &FreshnessPolicy::RIDE_LISTINGS,
//!         ResolveOptions::new(),
//!     )
//!     .await?;
//! assert_eq!(rides.len(), 1);
//! # Ok::<(), String>(())
//! # });
//! ```
//!
//! ## Durable tier
//!
//! ```
//! use ridecache::{CacheStore, FreshnessPolicy, Overrides, TelemetryConfig};
//! use ridecache_durable::{DurableTier, MemoryKeyValueStore};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let store = CacheStore::builder::<u32>(Clock::new_frozen())
//!     .name("wallet")
//!     .durable(DurableTier::new(MemoryKeyValueStore::new()))
//!     .telemetry(TelemetryConfig::new().with_logs().build())
//!     .build();
//!
//! store.set("balance:u1", 1_250, &FreshnessPolicy::USER_PROFILE, Overrides::new()).await;
//! assert_eq!(store.durable().store().len(), 1);
//! # });
//! ```

pub mod builder;
pub mod carpool;
pub mod invalidation;
pub mod keys;
pub mod policy;
pub mod revalidate;
mod runtime;
pub mod store;
mod telemetry;

#[doc(inline)]
pub use builder::CacheStoreBuilder;
#[doc(inline)]
pub use carpool::{CachedPayload, CarpoolBackend, CarpoolData, Ride, Transaction, UserProfile};
#[doc(inline)]
pub use invalidation::Invalidation;
#[doc(inline)]
pub use keys::RideFilters;
#[doc(inline)]
pub use policy::{FreshnessPolicy, Overrides};
#[doc(inline)]
pub use revalidate::{ResolveOptions, Revalidator};
#[doc(inline)]
pub use ridecache_tier::{CacheEntry, CacheTier, Error, Freshness, FreshnessWindow, NoopTier, Result};
#[doc(inline)]
pub use store::{CacheName, CacheStore, DEFAULT_CACHE_NAME, Lookup};
#[doc(inline)]
pub use telemetry::{CacheTelemetry, TelemetryConfig};
