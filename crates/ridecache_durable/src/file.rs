// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::{KeyValueStore, StoreError, StoreErrorKind};

/// A [`KeyValueStore`] backed by a single JSON document on disk.
///
/// The document is a flat JSON object mapping keys to string values. It is read once
/// when the store is opened and rewritten in full on every mutation: the new content
/// goes to a temporary file in the same directory, which then replaces the document
/// by rename. A crash mid-write leaves either the old or the new document.
///
/// # Performance
///
/// Each `set_item` and `remove_item` copies the whole map, writes and `fsync`s the
/// full document, and holds the store's lock while doing so. The calls are blocking:
/// a [`DurableTier`](crate::DurableTier) over this store performs that disk I/O on
/// whichever thread polls the cache operation, including async executor threads that
/// run background refreshes. It suits small caches of a few hundred entries with
/// modest write rates; reads are served from memory and never touch the disk.
///
/// # Examples
///
/// ```no_run
/// use ridecache_durable::{FileKeyValueStore, KeyValueStore};
///
/// let store = FileKeyValueStore::open("/var/lib/carpool/cache.json")?;
/// store.set_item("ridecache:static:terms", "\"...\"")?;
/// # Ok::<(), ridecache_durable::StoreError>(())
/// ```
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the document at `path`, creating parent directories as needed.
    ///
    /// A missing or empty file opens as an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::Io`] if the file or its directory cannot be accessed,
    /// and [`StoreErrorKind::Corrupt`] if the file is not a JSON object of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::caused_by(StoreErrorKind::Io, e))?;
        }

        let items = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::caused_by(StoreErrorKind::Corrupt, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::caused_by(StoreErrorKind::Io, e)),
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// Returns the path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_vec(items).map_err(|e| StoreError::caused_by(StoreErrorKind::Serialization, e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| StoreError::caused_by(StoreErrorKind::Io, e))?;
        temp.write_all(&json).map_err(|e| StoreError::caused_by(StoreErrorKind::Io, e))?;
        temp.as_file().sync_all().map_err(|e| StoreError::caused_by(StoreErrorKind::Io, e))?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::caused_by(StoreErrorKind::Io, e.error))?;
        Ok(())
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StoreError> {
        let mut items = self.items.lock();
        let mut next = items.clone();
        if !apply(&mut next) {
            return Ok(());
        }

        self.persist(&next)?;
        *items = next;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(|items| {
            items.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.mutate(|items| items.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}
