use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tranche_core::{
    BucketWidth, CacheStore, Clock, KEY_SEPARATOR, KeySpace, PricePoint, SystemClock, Ticker,
    TrancheConfig, TrancheError, TtlPolicy, UpstreamFetch,
};

/// Bucketed range cache over one upstream and one cache store.
///
/// Cheap to share behind an `Arc`; every query is independent and the only
/// shared state lives in the external store.
pub struct Tranche {
    pub(crate) upstream: Arc<dyn UpstreamFetch>,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) width: BucketWidth,
    pub(crate) ttl: TtlPolicy,
    pub(crate) keys: KeySpace,
    pub(crate) cfg: TrancheConfig,
}

/// Builder for constructing a `Tranche` with custom configuration.
pub struct TrancheBuilder {
    upstream: Option<Arc<dyn UpstreamFetch>>,
    store: Option<Arc<dyn CacheStore>>,
    clock: Option<Arc<dyn Clock>>,
    cfg: TrancheConfig,
}

impl Default for TrancheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrancheBuilder {
    /// Create a new builder with sensible defaults.
    ///
    /// Behavior and trade-offs:
    /// - Starts without collaborators; an upstream and a store are required.
    /// - Defaults: weekly buckets, 10 minute TTL for open buckets, 30 day TTL
    ///   for closed ones, four buckets filled concurrently, no timeouts, no key
    ///   namespace, wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            upstream: None,
            store: None,
            clock: None,
            cfg: TrancheConfig::default(),
        }
    }

    /// Set the upstream price source.
    #[must_use]
    pub fn with_upstream(mut self, upstream: Arc<dyn UpstreamFetch>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Set the cache store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the clock used to tell open buckets from closed ones.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the whole configuration at once.
    #[must_use]
    pub fn config(mut self, cfg: TrancheConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the bucket width.
    ///
    /// Behavior and trade-offs:
    /// - Must be a whole, positive number of seconds.
    /// - Wider buckets mean fewer upstream calls per query but more data fetched
    ///   beyond the requested range, and longer-lived open buckets.
    /// - Changing the width of a deployment changes every key; set a fresh
    ///   [`key_namespace`](Self::key_namespace) when doing so against a shared store.
    #[must_use]
    pub const fn bucket_width(mut self, width: Duration) -> Self {
        self.cfg.bucket_width = width;
        self
    }

    /// TTL for buckets whose end has not passed yet.
    #[must_use]
    pub const fn open_bucket_ttl(mut self, ttl: Duration) -> Self {
        self.cfg.open_bucket_ttl = ttl;
        self
    }

    /// TTL for buckets fully in the past.
    #[must_use]
    pub const fn closed_bucket_ttl(mut self, ttl: Duration) -> Self {
        self.cfg.closed_bucket_ttl = ttl;
        self
    }

    /// Maximum number of buckets filled at once for a single query.
    ///
    /// `1` fills strictly in chronological order. Higher values lower latency
    /// for long ranges at the cost of bursts against the upstream.
    #[must_use]
    pub const fn max_concurrent_buckets(mut self, n: usize) -> Self {
        self.cfg.max_concurrent_buckets = n;
        self
    }

    /// Reject range queries spanning more than `n` buckets with `InvalidArg`.
    #[must_use]
    pub const fn max_buckets_per_query(mut self, n: u64) -> Self {
        self.cfg.max_buckets_per_query = n;
        self
    }

    /// Timeout for each individual upstream call.
    ///
    /// An expired call fails its bucket, and therefore the range, with an
    /// upstream error.
    #[must_use]
    pub const fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.upstream_timeout = Some(timeout);
        self
    }

    /// Overall deadline for a range query.
    ///
    /// On expiry the query fails with `Cancelled`; cache writes already in
    /// flight still complete.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.request_timeout = Some(timeout);
        self
    }

    /// Prefix every cache key with `"{namespace}:"`.
    #[must_use]
    pub fn key_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.cfg.key_namespace = Some(namespace.into());
        self
    }

    /// Build the `Tranche`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the upstream or store is missing, the bucket
    /// width is not a positive whole number of seconds, the concurrency or
    /// bucket cap is zero, or the key namespace is empty or contains the key separator.
    pub fn build(self) -> Result<Tranche, TrancheError> {
        let upstream = self.upstream.ok_or_else(|| {
            TrancheError::InvalidArg(
                "no upstream registered; add one via with_upstream(...)".to_string(),
            )
        })?;
        let store = self.store.ok_or_else(|| {
            TrancheError::InvalidArg(
                "no cache store registered; add one via with_store(...)".to_string(),
            )
        })?;
        let width = BucketWidth::from_duration(self.cfg.bucket_width)?;
        if self.cfg.max_concurrent_buckets == 0 {
            return Err(TrancheError::InvalidArg(
                "max_concurrent_buckets must be at least 1".to_string(),
            ));
        }
        if self.cfg.max_buckets_per_query == 0 {
            return Err(TrancheError::InvalidArg(
                "max_buckets_per_query must be at least 1".to_string(),
            ));
        }
        if let Some(ns) = &self.cfg.key_namespace
            && (ns.is_empty() || ns.contains(KEY_SEPARATOR))
        {
            return Err(TrancheError::InvalidArg(format!(
                "key namespace {ns:?} must be non-empty and must not contain {KEY_SEPARATOR:?}"
            )));
        }

        Ok(Tranche {
            upstream,
            store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            width,
            ttl: TtlPolicy::from_config(&self.cfg),
            keys: KeySpace::new(self.cfg.key_namespace.clone()),
            cfg: self.cfg,
        })
    }
}

/// Keep upstream errors as they are; tag anything else with the upstream name.
pub(crate) fn tag_upstream_err(upstream: &str, e: TrancheError) -> TrancheError {
    match e {
        e @ TrancheError::Upstream { .. } => e,
        other => TrancheError::upstream(upstream, other.to_string()),
    }
}

impl Tranche {
    /// Start building a new `Tranche`.
    ///
    /// ```rust,ignore
    /// let tranche = Tranche::builder()
    ///     .with_upstream(upstream)
    ///     .with_store(store)
    ///     .request_timeout(std::time::Duration::from_secs(30))
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> TrancheBuilder {
        TrancheBuilder::new()
    }

    /// The configuration this instance was built with.
    #[must_use]
    pub const fn config(&self) -> &TrancheConfig {
        &self.cfg
    }

    /// The validated bucket width.
    #[must_use]
    pub const fn bucket_width(&self) -> BucketWidth {
        self.width
    }

    /// The key space used to derive cache keys.
    #[must_use]
    pub const fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    /// Call the upstream for `[start, end)` under the optional per-call timeout.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tranche::core::upstream_call_with_timeout",
            skip_all,
            fields(
                upstream = self.upstream.name(),
                ticker = %ticker,
                start = %start,
                end = %end,
            ),
        )
    )]
    pub(crate) async fn upstream_call_with_timeout(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError> {
        let name = self.upstream.name();
        let fut = self.upstream.fetch_range(ticker, start, end);
        let res = match self.cfg.upstream_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .unwrap_or_else(|_| Err(TrancheError::upstream_timeout(name, timeout))),
            None => fut.await,
        };
        res.map_err(|e| {
            let e = tag_upstream_err(name, e);
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "upstream fetch failed");
            e
        })
    }
}
