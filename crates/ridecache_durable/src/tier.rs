// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use ridecache_tier::{CacheEntry, CacheTier, Error};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::record::PersistedRecord;
use crate::{KeyValueStore, StoreError, StoreErrorKind};

/// Namespace prepended to every key a [`DurableTier`] writes, unless overridden.
pub const DEFAULT_NAMESPACE: &str = "ridecache:";

/// A cache tier persisted through a [`KeyValueStore`].
///
/// Values are encoded as JSON records under `namespace + key`. Every key the tier
/// writes starts with its namespace, so [`clear`](CacheTier::clear) removes only
/// this tier's records and leaves the rest of a shared store alone.
///
/// A record that cannot be decoded is reported from `get` as an error whose
/// [`is_corrupt`](Error::is_corrupt) is true; the caller decides whether to remove it.
/// Store failures are reported as ordinary errors.
#[derive(Debug)]
pub struct DurableTier<S> {
    store: S,
    namespace: String,
}

impl<S> DurableTier<S>
where
    S: KeyValueStore,
{
    /// Creates a tier over `store` using [`DEFAULT_NAMESPACE`].
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }

    /// Sets the namespace prepended to every key.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the namespace prepended to every key.
    #[must_use]
    pub fn namespace_prefix(&self) -> &str {
        &self.namespace
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    fn owned_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(&self.namespace))
            .collect())
    }
}

impl<S, V> CacheTier<String, V> for DurableTier<S>
where
    S: KeyValueStore,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &String) -> Result<Option<CacheEntry<V>>, Error> {
        let Some(raw) = self.store.get_item(&self.storage_key(key))? else {
            return Ok(None);
        };

        let record: PersistedRecord<V> =
            serde_json::from_str(&raw).map_err(|e| StoreError::caused_by(StoreErrorKind::Corrupt, e))?;
        Ok(Some(record.into_entry()))
    }

    async fn insert(&self, key: &String, entry: CacheEntry<V>) -> Result<(), Error> {
        let json = serde_json::to_string(&PersistedRecord::borrowed(&entry))
            .map_err(|e| StoreError::caused_by(StoreErrorKind::Serialization, e))?;
        self.store.set_item(&self.storage_key(key), &json)?;
        Ok(())
    }

    async fn invalidate(&self, key: &String) -> Result<(), Error> {
        self.store.remove_item(&self.storage_key(key))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        let mut first_error = None;
        for key in self.owned_keys()? {
            if let Err(e) = self.store.remove_item(&key) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    fn len(&self) -> Option<u64> {
        self.owned_keys().ok().map(|keys| keys.len() as u64)
    }
}
