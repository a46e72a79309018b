// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{KeyValueStore, StoreError, StoreErrorKind};

/// An in-process [`KeyValueStore`].
///
/// With a quota, the combined byte length of all keys and values is capped and
/// a write that would cross the cap fails with [`StoreErrorKind::QuotaExceeded`].
///
/// # Examples
///
/// ```
/// use ridecache_durable::{KeyValueStore, MemoryKeyValueStore, StoreErrorKind};
///
/// let store = MemoryKeyValueStore::with_quota(8);
/// store.set_item("k", "1234").unwrap();
///
/// let err = store.set_item("other", "1234").unwrap_err();
/// assert_eq!(err.kind(), StoreErrorKind::QuotaExceeded);
/// ```
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryKeyValueStore {
    /// Creates an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that holds at most `bytes` bytes of keys and values.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Returns the number of bytes currently used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.items.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Returns the number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock();

        if let Some(quota) = self.quota {
            let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
            let used: usize = items.iter().map(|(k, v)| k.len() + v.len()).sum();
            let needed = used - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::caused_by(
                    StoreErrorKind::QuotaExceeded,
                    format!("write of {} bytes exceeds quota of {quota} bytes", key.len() + value.len()),
                ));
            }
        }

        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}
