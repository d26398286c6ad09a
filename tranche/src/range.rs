use std::future::Future;

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use tranche_core::{
    BucketFill, RangeReport, Series, Ticker, TrancheError, bucket_count, buckets_overlapping,
};

use crate::core::Tranche;
use crate::fill::BucketOutcome;
use crate::util::with_request_deadline;

impl Tranche {
    /// All points for `ticker` with `start <= timestamp < end`.
    ///
    /// Behavior and trade-offs:
    /// - Splits the range into epoch-aligned buckets and fills each one
    ///   cache-aside, at most `max_concurrent_buckets` at a time.
    /// - Buckets are concatenated in chronological order no matter which
    ///   finished first, then trimmed to the exact request.
    /// - The first upstream failure fails the whole query; no partial series.
    ///
    /// # Errors
    /// - `InvalidRange` if `end <= start`.
    /// - `InvalidArg` if the range spans more than `max_buckets_per_query` buckets.
    /// - `Upstream` if any bucket's upstream call fails or times out.
    /// - `Cancelled` if the configured request deadline passes.
    pub async fn get_range(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Series, TrancheError> {
        self.get_range_report(ticker, start, end)
            .await
            .map(|r| r.series)
    }

    /// Same as [`get_range`](Self::get_range), plus per-bucket attribution and
    /// the cache problems absorbed while answering.
    ///
    /// # Errors
    /// See [`get_range`](Self::get_range).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tranche::range::get_range_report",
            skip_all,
            fields(ticker = %ticker, start = %start, end = %end),
        )
    )]
    pub async fn get_range_report(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RangeReport, TrancheError> {
        with_request_deadline(self.cfg.request_timeout, self.assemble(ticker, start, end)).await
    }

    /// Like [`get_range`](Self::get_range) but abandons the query as soon as
    /// `cancel` resolves.
    ///
    /// In-flight upstream calls and cache reads are dropped; cache writes that
    /// already started still complete in the background. The configured
    /// request deadline applies as well.
    ///
    /// # Errors
    /// See [`get_range`](Self::get_range); caller cancellation yields `Cancelled`.
    pub async fn get_range_until<C>(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cancel: C,
    ) -> Result<Series, TrancheError>
    where
        C: Future<Output = ()>,
    {
        if end <= start {
            return Err(TrancheError::invalid_range(start, end));
        }
        tokio::select! {
            biased;
            () = cancel => {
                #[cfg(feature = "tracing")]
                tracing::debug!(ticker = %ticker, "range query cancelled by caller");
                Err(TrancheError::cancelled("cancelled by caller"))
            }
            res = self.get_range(ticker, start, end) => res,
        }
    }

    async fn assemble(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RangeReport, TrancheError> {
        let count = bucket_count(start, end, self.width)?;
        if count > self.cfg.max_buckets_per_query {
            return Err(TrancheError::InvalidArg(format!(
                "range {start}..{end} spans {count} buckets, more than max_buckets_per_query ({})",
                self.cfg.max_buckets_per_query
            )));
        }
        let buckets = buckets_overlapping(start, end, self.width)?;
        let now = self.clock.now();

        // `buffered` yields in input order, so completion order never leaks
        // into the result, and the first error ends the stream.
        let outcomes: Vec<BucketOutcome> = futures::stream::iter(buckets)
            .map(|bucket| self.fill_bucket(ticker, bucket, now))
            .buffered(self.cfg.max_concurrent_buckets)
            .try_collect()
            .await?;

        let mut fills = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();
        let mut parts = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            fills.push(BucketFill {
                start: outcome.start,
                source: outcome.source,
            });
            warnings.extend(outcome.warnings);
            parts.push(outcome.series);
        }

        let mut series = Series::concat(ticker.clone(), parts);
        series.retain_within(start, end);

        let report = RangeReport {
            ticker: ticker.clone(),
            start,
            end,
            series,
            buckets: fills,
            warnings,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            buckets = report.buckets.len(),
            cache_hits = report.cache_hits(),
            points = report.series.len(),
            warnings = report.warnings.len(),
            "range assembled"
        );
        Ok(report)
    }
}
