//! Two-tier cache lifetime policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tranche_types::{DEFAULT_CLOSED_BUCKET_TTL, DEFAULT_OPEN_BUCKET_TTL, TrancheConfig};

use crate::bucket::Bucket;

/// Maps a bucket and the current time to a cache lifetime.
///
/// Open buckets (`end >= now`) can still change upstream, so they get the
/// short `open` TTL and the cache self-corrects as intraday data settles.
/// Closed buckets (`end < now`) are history and get the long `closed` TTL.
/// A bucket whose end equals `now` is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// Lifetime of open buckets.
    pub open: Duration,
    /// Lifetime of closed buckets.
    pub closed: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN_BUCKET_TTL,
            closed: DEFAULT_CLOSED_BUCKET_TTL,
        }
    }
}

impl TtlPolicy {
    /// Policy with explicit lifetimes.
    #[must_use]
    pub const fn new(open: Duration, closed: Duration) -> Self {
        Self { open, closed }
    }

    /// Policy taken from the configured open/closed TTLs.
    #[must_use]
    pub const fn from_config(cfg: &TrancheConfig) -> Self {
        Self::new(cfg.open_bucket_ttl, cfg.closed_bucket_ttl)
    }

    /// Lifetime for `bucket` as seen at `now`.
    #[must_use]
    pub fn ttl_for(&self, bucket: &Bucket, now: DateTime<Utc>) -> Duration {
        if bucket.is_open_at(now) {
            self.open
        } else {
            self.closed
        }
    }
}
