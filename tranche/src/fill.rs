use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tranche_core::{
    Bucket, BucketSource, Series, Ticker, TrancheError, decode_series, encode_series,
};

use crate::core::Tranche;

/// Result of filling one bucket, with the non-fatal issues met on the way.
pub(crate) struct BucketOutcome {
    pub(crate) start: DateTime<Utc>,
    pub(crate) series: Series,
    pub(crate) source: BucketSource,
    pub(crate) warnings: Vec<TrancheError>,
}

fn as_read_failure(e: TrancheError) -> TrancheError {
    if e.is_cache_failure() {
        e
    } else {
        TrancheError::CacheRead(e.to_string())
    }
}

fn as_write_failure(e: TrancheError) -> TrancheError {
    if e.is_cache_failure() {
        e
    } else {
        TrancheError::CacheWrite(e.to_string())
    }
}

impl Tranche {
    /// Return the series for exactly one bucket, from cache if possible.
    ///
    /// On a hit the cached series is returned as stored. On a miss, a failed
    /// read or an undecodable entry the upstream is asked for
    /// `[bucket.start, bucket.end)`; points it returns outside that interval
    /// are discarded, and the rest is written back with the TTL that `now`
    /// implies for this bucket. Cache problems are logged and
    /// never returned.
    ///
    /// # Errors
    /// Returns the upstream's error unmodified (`Upstream`), including
    /// per-call timeouts.
    pub async fn fetch_or_fill(
        &self,
        ticker: &Ticker,
        bucket: Bucket,
        now: DateTime<Utc>,
    ) -> Result<Series, TrancheError> {
        self.fill_bucket(ticker, bucket, now).await.map(|o| o.series)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tranche::fill::fill_bucket",
            skip_all,
            fields(ticker = %ticker, bucket_start = %bucket.start()),
        )
    )]
    pub(crate) async fn fill_bucket(
        &self,
        ticker: &Ticker,
        bucket: Bucket,
        now: DateTime<Utc>,
    ) -> Result<BucketOutcome, TrancheError> {
        let key = self.keys.key_for(ticker, &bucket);
        let mut warnings = Vec::new();

        match self.store.get(&key).await {
            Ok(Some(bytes)) => match decode_series(&bytes) {
                Ok(series) if series.ticker() == ticker => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(key = %key, points = series.len(), "bucket cache hit");
                    return Ok(BucketOutcome {
                        start: bucket.start(),
                        series,
                        source: BucketSource::Cache,
                        warnings,
                    });
                }
                Ok(series) => {
                    let e = TrancheError::Codec(format!(
                        "entry {key} holds series for {}, expected {ticker}",
                        series.ticker()
                    ));
                    #[cfg(feature = "tracing")]
                    tracing::warn!(key = %key, error = %e, "cached bucket rejected; refetching");
                    warnings.push(e);
                }
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(key = %key, error = %e, "cached bucket undecodable; refetching");
                    warnings.push(e);
                }
            },
            Ok(None) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(key = %key, "bucket cache miss");
            }
            Err(e) => {
                let e = as_read_failure(e);
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    store = self.store.name(),
                    key = %key,
                    error = %e,
                    "cache read failed; treating as miss"
                );
                warnings.push(e);
            }
        }

        let points = self
            .upstream_call_with_timeout(ticker, bucket.start(), bucket.end())
            .await?;
        #[cfg(feature = "tracing")]
        let fetched = points.len();
        let mut series = Series::from_points(ticker.clone(), points);
        series.retain_within(bucket.start(), bucket.end());
        #[cfg(feature = "tracing")]
        if series.len() < fetched {
            tracing::debug!(
                key = %key,
                dropped = fetched - series.len(),
                "dropped foreign, duplicate or out-of-bucket upstream points"
            );
        }

        let ttl = self.ttl.ttl_for(&bucket, now);
        if let Some(e) = self.write_back(key, &series, ttl).await {
            warnings.push(e);
        }

        Ok(BucketOutcome {
            start: bucket.start(),
            series,
            source: BucketSource::Upstream,
            warnings,
        })
    }

    /// Encode and store `series`; returns the failure, if any, as a warning.
    ///
    /// The store call runs on its own task: if the caller is dropped while
    /// waiting, the write still completes.
    async fn write_back(&self, key: String, series: &Series, ttl: Duration) -> Option<TrancheError> {
        let bytes = match encode_series(series) {
            Ok(bytes) => bytes,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %key, error = %e, "bucket not cacheable; skipping write");
                return Some(e);
            }
        };

        let store = Arc::clone(&self.store);
        #[cfg(feature = "tracing")]
        let log_key = key.clone();
        let task = tokio::spawn(async move { store.set(&key, bytes, ttl).await });

        match task.await {
            Ok(Ok(())) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(key = %log_key, ttl_secs = ttl.as_secs(), "bucket cached");
                None
            }
            Ok(Err(e)) => {
                let e = as_write_failure(e);
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    store = self.store.name(),
                    key = %log_key,
                    error = %e,
                    "cache write failed; continuing"
                );
                Some(e)
            }
            Err(join) => {
                let e = TrancheError::CacheWrite(format!("write task failed: {join}"));
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "cache write task did not finish");
                Some(e)
            }
        }
    }
}
