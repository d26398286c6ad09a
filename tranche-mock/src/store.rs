use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tranche_core::{CacheStore, TrancheError};

/// Plain map store that never expires entries but remembers each write's TTL.
///
/// Lets tests inspect exactly what the range cache wrote and poison entries
/// with arbitrary bytes.
#[derive(Default)]
pub struct MapStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
}

impl MapStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL recorded for `key`, if present.
    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().await.get(key).map(|(_, ttl)| *ttl)
    }

    /// Raw bytes stored under `key`, if present.
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().await.get(key).map(|(b, _)| b.clone())
    }

    /// Sorted list of stored keys.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Store `bytes` under `key` directly, bypassing any codec.
    pub async fn insert_raw(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.entries
            .lock()
            .await
            .insert(key.into(), (bytes, Duration::MAX));
    }
}

#[async_trait]
impl CacheStore for MapStore {
    fn name(&self) -> &'static str {
        "map"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrancheError> {
        Ok(self.raw(key).await)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TrancheError> {
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), (value, ttl));
        Ok(())
    }
}

/// Store that is down: reads and/or writes fail.
pub struct UnavailableStore {
    fail_reads: bool,
    fail_writes: bool,
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UnavailableStore {
    /// Every read and write fails.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
        }
    }

    /// Reads succeed as misses; writes fail.
    #[must_use]
    pub const fn failing_writes() -> Self {
        Self {
            fail_reads: false,
            fail_writes: true,
        }
    }
}

#[async_trait]
impl CacheStore for UnavailableStore {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, TrancheError> {
        if self.fail_reads {
            return Err(TrancheError::CacheRead("connection refused".into()));
        }
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), TrancheError> {
        if self.fail_writes {
            return Err(TrancheError::CacheWrite("connection refused".into()));
        }
        Ok(())
    }
}

/// Wrapper that counts reads, hits and writes on another store.
///
/// An optional write delay keeps writes in flight long enough for tests to
/// cancel the query around them.
pub struct CountingStore {
    inner: Arc<dyn CacheStore>,
    gets: AtomicUsize,
    hits: AtomicUsize,
    sets: AtomicUsize,
    set_delay: Option<Duration>,
}

impl CountingStore {
    /// Count calls on `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            hits: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            set_delay: None,
        }
    }

    /// Sleep for `delay` before forwarding every write.
    #[must_use]
    pub const fn with_set_delay(mut self, delay: Duration) -> Self {
        self.set_delay = Some(delay);
        self
    }

    /// Number of `get` calls.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `get` calls that returned a value.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Number of completed `set` calls.
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrancheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let out = self.inner.get(key).await?;
        if out.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(out)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TrancheError> {
        if let Some(delay) = self.set_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.set(key, value, ttl).await?;
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
