// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Bounded in-process cache tier.
//!
//! This crate provides [`InMemoryTier`], the fast tier of a two-tier cache. It holds
//! at most a fixed number of entries; inserting a new key into a full tier evicts
//! the oldest-inserted entry first, regardless of how fresh that entry is.
//!
//! # Quick Start
//!
//! ```
//! use ridecache_memory::InMemoryTierBuilder;
//! use ridecache_tier::{CacheEntry, CacheTier, FreshnessWindow};
//! use std::time::{Duration, SystemTime};
//!
//! # futures::executor::block_on(async {
//! let tier = InMemoryTierBuilder::<String, i32>::new().max_entries(2).build();
//! let window = FreshnessWindow::new(Duration::from_secs(60), Duration::from_secs(600));
//!
//! for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
//!     tier.insert(&key.to_string(), CacheEntry::new(i as i32, SystemTime::UNIX_EPOCH, window))
//!         .await
//!         .unwrap();
//! }
//!
//! // "a" was the oldest insertion and made room for "c".
//! assert!(tier.get(&"a".to_string()).await.unwrap().is_none());
//! assert_eq!(tier.keys_oldest_first(), vec!["b".to_string(), "c".to_string()]);
//! # });
//! ```

pub mod builder;
pub mod tier;

#[doc(inline)]
pub use builder::InMemoryTierBuilder;
#[doc(inline)]
pub use tier::InMemoryTier;
