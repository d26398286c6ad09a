//! Configuration types shared across the orchestrator and middleware.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One week, the default bucket width.
pub const DEFAULT_BUCKET_WIDTH: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Lifetime of a cached bucket whose end has not passed yet.
pub const DEFAULT_OPEN_BUCKET_TTL: Duration = Duration::from_secs(10 * 60);
/// Lifetime of a cached bucket that lies fully in the past.
pub const DEFAULT_CLOSED_BUCKET_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Bucket cap per range query; about two centuries of weekly buckets.
pub const DEFAULT_MAX_BUCKETS_PER_QUERY: u64 = 10_000;

/// Global configuration for the `Tranche` range cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheConfig {
    /// Width of every bucket. Buckets are aligned to multiples of this width
    /// counted from the Unix epoch; only whole seconds are significant.
    pub bucket_width: Duration,
    /// TTL for buckets that are still open (`bucket.end >= now`).
    pub open_bucket_ttl: Duration,
    /// TTL for buckets that are closed (`bucket.end < now`).
    pub closed_bucket_ttl: Duration,
    /// Maximum number of buckets filled concurrently for one range query.
    /// `1` fills buckets strictly one after another.
    pub max_concurrent_buckets: usize,
    /// Upper bound on the number of buckets one range query may span.
    /// Larger ranges are rejected before any I/O.
    pub max_buckets_per_query: u64,
    /// Optional timeout applied to each individual upstream call.
    /// Exceeding it fails the bucket with an upstream error.
    pub upstream_timeout: Option<Duration>,
    /// Optional deadline for a whole range query.
    /// Exceeding it cancels the query.
    pub request_timeout: Option<Duration>,
    /// Optional prefix prepended to every cache key as `"{namespace}:"`.
    pub key_namespace: Option<String>,
}

impl Default for TrancheConfig {
    fn default() -> Self {
        Self {
            bucket_width: DEFAULT_BUCKET_WIDTH,
            open_bucket_ttl: DEFAULT_OPEN_BUCKET_TTL,
            closed_bucket_ttl: DEFAULT_CLOSED_BUCKET_TTL,
            max_concurrent_buckets: 4,
            max_buckets_per_query: DEFAULT_MAX_BUCKETS_PER_QUERY,
            upstream_timeout: None,
            request_timeout: None,
            key_namespace: None,
        }
    }
}

/// Exponential backoff configuration for retrying upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
    /// Total attempts including the first call (>= 1).
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 500,
            max_backoff_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
            max_attempts: 3,
        }
    }
}

impl BackoffConfig {
    /// Base delay (before jitter) to wait after the given failed attempt.
    ///
    /// `attempt` is 1-based: the delay after the first failure is
    /// `min_backoff_ms`, and each further failure multiplies it by `factor`,
    /// capped at `max_backoff_ms`.
    #[must_use]
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = u64::from(self.factor.max(1));
        let mut delay = self.min_backoff_ms;
        for _ in 1..attempt {
            delay = delay.saturating_mul(factor);
            if delay >= self.max_backoff_ms {
                return self.max_backoff_ms;
            }
        }
        delay.min(self.max_backoff_ms)
    }
}
