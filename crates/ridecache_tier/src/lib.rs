// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core cache tier abstractions for building cache backends.
//!
//! This crate defines the [`CacheTier`] trait that every storage tier satisfies,
//! along with [`CacheEntry`] for storing values with their write time and
//! [`FreshnessWindow`], and the [`Freshness`] classification used for
//! stale-while-revalidate reads.
//!
//! # Freshness
//!
//! Every entry carries the window it was written with. Its age against a given
//! wall-clock time puts it in one of three states:
//!
//! - [`Freshness::Fresh`] while `age < max_age`
//! - [`Freshness::Stale`] while `max_age <= age < max_age + stale_while_revalidate`
//! - [`Freshness::Expired`] afterwards
//!
//! ```
//! use std::time::{Duration, SystemTime};
//! use ridecache_tier::{CacheEntry, Freshness, FreshnessWindow};
//!
//! let written = SystemTime::UNIX_EPOCH;
//! let window = FreshnessWindow::new(Duration::from_secs(120), Duration::from_secs(3600));
//! let entry = CacheEntry::new("rides", written, window);
//!
//! assert_eq!(entry.freshness_at(written + Duration::from_secs(60)), Freshness::Fresh);
//! assert_eq!(entry.freshness_at(written + Duration::from_secs(200)), Freshness::Stale);
//! assert_eq!(entry.freshness_at(written + Duration::from_secs(4000)), Freshness::Expired);
//! ```
//!
//! # Implementing a Cache Tier
//!
//! ```
//! use ridecache_tier::{CacheEntry, CacheTier, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleTier<K, V>(RwLock<HashMap<K, CacheEntry<V>>>);
//!
//! impl<K, V> CacheTier<K, V> for SimpleTier<K, V>
//! where
//!     K: Clone + Eq + std::hash::Hash + Send + Sync,
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.clone(), entry);
//!         Ok(())
//!     }
//!
//!     async fn invalidate(&self, key: &K) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```

mod entry;
pub mod error;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use entry::{CacheEntry, Freshness, FreshnessWindow};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use tier::{CacheTier, NoopTier};
