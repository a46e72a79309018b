// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test helpers shared by the ridecache crates.
//!
//! This module provides `MockCache`, an in-memory tier that records all
//! operations and supports failure injection, so that the error paths of
//! stores built on top of it (corrupt reads, failed writes) can be exercised.
//! `LogCapture` collects formatted `tracing` output for assertions.

use std::{collections::HashMap, hash::Hash, io::Write, sync::Arc};

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

use crate::{CacheEntry, CacheTier, Error};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<K, V> {
    /// A get operation was performed with the given key.
    Get(K),
    /// An insert operation was performed with the given key and entry.
    Insert {
        /// The key that was inserted.
        key: K,
        /// The cache entry that was inserted.
        entry: CacheEntry<V>,
    },
    /// An invalidate operation was performed with the given key.
    Invalidate(K),
    /// A clear operation was performed.
    Clear,
}

type FailPredicate<K, V> = Box<dyn Fn(&CacheOp<K, V>) -> bool + Send + Sync>;

/// A configurable mock tier for testing.
///
/// Failed operations are recorded but leave the stored data untouched.
///
/// # Examples
///
/// ```
/// use ridecache_tier::{testing::{MockCache, CacheOp}, CacheTier};
///
/// # futures::executor::block_on(async {
/// let cache: MockCache<String, i32> = MockCache::new();
///
/// // Fail gets for a specific key
/// cache.fail_when(|op| matches!(op, CacheOp::Get(k) if k == "forbidden"));
/// assert!(cache.get(&"forbidden".to_string()).await.is_err());
/// assert!(cache.get(&"allowed".to_string()).await.is_ok());
/// # });
/// ```
pub struct MockCache<K, V> {
    data: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    operations: Arc<Mutex<Vec<CacheOp<K, V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<K, V>>>>,
}

impl<K, V> std::fmt::Debug for MockCache<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<K, V> Clone for MockCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<K, V> Default for MockCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockCache<K, V> {
    /// Creates a new empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }
}

impl<K, V> MockCache<K, V>
where
    K: Eq + Hash,
{
    /// Returns the number of entries in the cache.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the cache contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Stores an entry directly, bypassing recording and failure injection.
    pub fn seed(&self, key: K, entry: CacheEntry<V>) {
        self.data.lock().insert(key, entry);
    }
}

impl<K, V> MockCache<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Sets a predicate that determines which operations fail.
    ///
    /// The predicate receives the operation and returns `true` if it should fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<K, V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<K, V>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: CacheOp<K, V>) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &CacheOp<K, V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl<K, V> CacheTier<K, V> for MockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<CacheEntry<V>>, Error> {
        let op = CacheOp::Get(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: get failed"));
        }
        Ok(self.data.lock().get(key).cloned())
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) -> Result<(), Error> {
        let op = CacheOp::Insert {
            key: key.clone(),
            entry: entry.clone(),
        };
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: insert failed"));
        }
        self.data.lock().insert(key.clone(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &K) -> Result<(), Error> {
        let op = CacheOp::Invalidate(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: invalidate failed"));
        }
        self.data.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        let op = CacheOp::Clear;
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: clear failed"));
        }
        self.data.lock().clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}

/// Captures formatted `tracing` output into a shared buffer.
///
/// # Examples
///
/// ```
/// use ridecache_tier::testing::LogCapture;
///
/// let capture = LogCapture::new();
/// let _guard = tracing::subscriber::set_default(capture.subscriber());
///
/// tracing::warn!(cache.key = "rides:1", "durable write failed");
/// capture.assert_contains("WARN");
/// capture.assert_contains("rides:1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything written so far.
    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).to_string()
    }

    /// Panics unless the output contains `expected`.
    ///
    /// # Panics
    ///
    /// When `expected` was not logged.
    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(
            output.contains(expected),
            "log output does not contain '{expected}', got:\n{output}"
        );
    }

    /// Returns a subscriber that writes every level into this capture.
    ///
    /// Use with `tracing::subscriber::set_default()` for thread-local capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + use<> {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Writer handed out by [`LogCapture`].
#[derive(Debug)]
pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::FreshnessWindow;

    fn entry(value: i32) -> CacheEntry<i32> {
        CacheEntry::new(
            value,
            SystemTime::UNIX_EPOCH,
            FreshnessWindow::new(Duration::from_secs(60), Duration::from_secs(600)),
        )
    }

    #[tokio::test]
    async fn mock_records_operations_in_order() {
        let cache = MockCache::<String, i32>::new();
        cache.insert(&"a".to_string(), entry(1)).await.expect("insert failed");
        let _ = cache.get(&"a".to_string()).await.expect("get failed");
        cache.invalidate(&"a".to_string()).await.expect("invalidate failed");
        cache.clear().await.expect("clear failed");

        assert_eq!(
            cache.operations(),
            vec![
                CacheOp::Insert {
                    key: "a".to_string(),
                    entry: entry(1)
                },
                CacheOp::Get("a".to_string()),
                CacheOp::Invalidate("a".to_string()),
                CacheOp::Clear,
            ]
        );
    }

    #[tokio::test]
    async fn mock_failed_insert_leaves_data_untouched() {
        let cache = MockCache::<String, i32>::new();
        cache.fail_when(|op| matches!(op, CacheOp::Insert { .. }));

        assert!(cache.insert(&"a".to_string(), entry(1)).await.is_err());
        assert!(!cache.contains_key(&"a".to_string()));

        cache.clear_failures();
        cache.insert(&"a".to_string(), entry(1)).await.expect("insert failed");
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn mock_seed_bypasses_recording() {
        let cache = MockCache::<String, i32>::new();
        cache.seed("a".to_string(), entry(7));
        assert!(cache.operations().is_empty());

        let found = cache.get(&"a".to_string()).await.expect("get failed").expect("seeded entry");
        assert_eq!(*found.value(), 7);
    }

    #[test]
    fn log_capture_collects_events_of_every_level() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        tracing::debug!("promoted");
        tracing::warn!(error = "disk full", "durable write failed");

        capture.assert_contains("DEBUG");
        capture.assert_contains("promoted");
        capture.assert_contains("disk full");
    }
}
