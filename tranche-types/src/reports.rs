//! Report envelopes produced by the range assembler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrancheError;
use crate::price::Series;
use crate::ticker::Ticker;

/// Where a bucket's data came from while answering a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BucketSource {
    /// Decoded from a cache entry.
    Cache,
    /// Fetched from the upstream source (and written back best-effort).
    Upstream,
}

/// Attribution for one bucket of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFill {
    /// Start of the bucket.
    pub start: DateTime<Utc>,
    /// Source that served the bucket.
    pub source: BucketSource,
}

/// Summary of a range query.
///
/// Carries the trimmed `series`, per-bucket attribution in chronological
/// order, and the non-fatal cache failures that were absorbed on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReport {
    /// Requested ticker.
    pub ticker: Ticker,
    /// Requested inclusive start.
    pub start: DateTime<Utc>,
    /// Requested exclusive end.
    pub end: DateTime<Utc>,
    /// Points with `start <= timestamp < end`.
    pub series: Series,
    /// One entry per bucket overlapping the request.
    pub buckets: Vec<BucketFill>,
    /// Non-fatal issues encountered while building the report.
    pub warnings: Vec<TrancheError>,
}

impl RangeReport {
    /// Number of buckets served from cache.
    #[must_use]
    pub fn cache_hits(&self) -> usize {
        self.buckets
            .iter()
            .filter(|b| b.source == BucketSource::Cache)
            .count()
    }

    /// Number of buckets that required an upstream call.
    #[must_use]
    pub fn upstream_fetches(&self) -> usize {
        self.buckets
            .iter()
            .filter(|b| b.source == BucketSource::Upstream)
            .count()
    }
}
