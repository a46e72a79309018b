// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Durable persistence tier for ridecache.
//!
//! The persistence contract is [`KeyValueStore`]: a synchronous string-to-string
//! store with `get_item`, `set_item`, `remove_item`, and `keys`. Two stores ship with
//! this crate:
//!
//! - [`MemoryKeyValueStore`] keeps everything in process, with an optional byte quota
//!   that makes writes fail the way a full device would.
//! - [`FileKeyValueStore`] keeps a single JSON document on disk and rewrites it
//!   atomically on every mutation.
//!
//! [`DurableTier`] adapts any store into a [`CacheTier`](ridecache_tier::CacheTier). Each
//! entry is stored as one JSON record under `namespace + key`:
//!
//! ```json
//! {"data": ..., "timestamp_ms": 1700000000000, "max_age_ms": 120000, "stale_while_revalidate_ms": 3600000}
//! ```
//!
//! # Example
//!
//! ```
//! use ridecache_durable::{DurableTier, KeyValueStore, MemoryKeyValueStore};
//! use ridecache_tier::{CacheEntry, CacheTier, FreshnessWindow};
//! use std::time::{Duration, SystemTime};
//!
//! # futures::executor::block_on(async {
//! let tier = DurableTier::new(MemoryKeyValueStore::new()).namespace("app:");
//! let window = FreshnessWindow::new(Duration::from_secs(120), Duration::from_secs(3600));
//!
//! tier.insert(&"rides:list".to_string(), CacheEntry::new(vec![1, 2, 3], SystemTime::UNIX_EPOCH, window))
//!     .await
//!     .unwrap();
//!
//! let entry: CacheEntry<Vec<u32>> = tier.get(&"rides:list".to_string()).await.unwrap().unwrap();
//! assert_eq!(entry.value(), &vec![1, 2, 3]);
//! assert!(tier.store().get_item("app:rides:list").unwrap().is_some());
//! # });
//! ```

mod error;
mod file;
mod memory;
mod record;
mod store;
mod tier;

pub use error::{StoreError, StoreErrorKind};
pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use store::KeyValueStore;
pub use tier::{DEFAULT_NAMESPACE, DurableTier};
