use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tranche_core::{CacheStore, TrancheError};

#[derive(Clone)]
struct StoredValue {
    bytes: Arc<Vec<u8>>,
    ttl: Duration,
}

// Each entry lives for the TTL it was written with; reads do not extend it.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-process key-value store with per-entry expiry.
///
/// Backed by `moka`'s async cache, so it is safe to share between tasks
/// without extra locking and every `set` is atomic per key. Entries beyond
/// `max_entries` are evicted by moka's TinyLFU policy. A zero TTL disables
/// caching for that write and drops any previous value under the key.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store holding at most `max_entries` bucket payloads.
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .name("tranche-memory-store")
            .max_capacity(max_entries.max(1))
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Approximate number of live entries.
    ///
    /// Moka applies writes and evictions lazily; call
    /// [`run_pending_tasks`](Self::run_pending_tasks) first for an exact count.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush moka's pending maintenance (evictions, expirations).
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrancheError> {
        Ok(self.inner.get(key).await.map(|v| v.bytes.as_ref().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TrancheError> {
        if ttl.is_zero() {
            self.inner.invalidate(key).await;
            return Ok(());
        }
        let stored = StoredValue {
            bytes: Arc::new(value),
            ttl,
        };
        self.inner.insert(key.to_owned(), stored).await;
        Ok(())
    }
}
