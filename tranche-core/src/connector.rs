//! Collaborator traits: the upstream price source and the byte cache store.
//!
//! Both are object safe and used behind `Arc<dyn _>`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tranche_types::{PricePoint, Ticker, TrancheError};

/// Upstream price source: the slow, rate-limited system being cached.
#[async_trait]
pub trait UpstreamFetch: Send + Sync {
    /// Stable name used in logs and upstream errors.
    fn name(&self) -> &'static str;

    /// Fetch all points for `ticker` with `start <= timestamp < end`.
    ///
    /// Implementations should return points sorted ascending. They own any
    /// retry policy; the caller never retries.
    ///
    /// # Errors
    /// Returns `Upstream` on network failure, unknown ticker, or a malformed
    /// response.
    async fn fetch_range(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError>;
}

/// External key-value store holding encoded bucket series.
///
/// `set` must be atomic per key: readers never observe a half-written value.
/// Failures are non-fatal to callers of the range cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Read the value under `key`; `Ok(None)` on a miss or an expired entry.
    ///
    /// # Errors
    /// Returns `CacheRead` when the store is unavailable.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TrancheError>;

    /// Write `value` under `key`, expiring after `ttl`.
    ///
    /// # Errors
    /// Returns `CacheWrite` when the store is unavailable.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), TrancheError>;
}
