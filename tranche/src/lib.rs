//! Tranche answers "prices of ticker X between A and B" queries on top of a
//! slow, rate-limited upstream, caching fixed-width time buckets so that
//! overlapping queries share work.
//!
//! Overview
//! - Every range is split into buckets aligned to multiples of the bucket width
//!   counted from the Unix epoch, so two different queries touching the same
//!   week hit the same cache key.
//! - Each bucket is fetched cache-aside: read the store, on a miss ask the
//!   upstream for exactly the bucket interval and write the result back.
//! - Buckets that may still change (their end has not passed) are cached
//!   briefly; historical buckets are cached for a long time.
//! - The assembled series is trimmed to the exact half-open request.
//!
//! Key behaviors and trade-offs
//! - Cache failures never fail a query. Reads that error or cannot be decoded
//!   are treated as misses, write failures are swallowed; both are logged and
//!   listed in [`RangeReport::warnings`].
//! - Upstream failures fail the whole range. No partial series is returned and
//!   no retry happens here; wrap the upstream in [`RetryingUpstream`] for that.
//! - Buckets are filled with bounded concurrency (`max_concurrent_buckets`);
//!   results are always concatenated in bucket order.
//! - A request deadline or caller cancellation aborts in-flight work with
//!   `Cancelled`; cache writes already started run to completion.
//!
//! Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use tranche::{MemoryStore, Tranche, Ticker};
//!
//! let tranche = Tranche::builder()
//!     .with_upstream(Arc::new(MyVendor::new()))
//!     .with_store(Arc::new(MemoryStore::new(50_000)))
//!     .bucket_width(std::time::Duration::from_secs(7 * 24 * 3600))
//!     .max_concurrent_buckets(8)
//!     .build()?;
//!
//! let aapl = Ticker::new("AAPL")?;
//! let series = tranche.get_range(&aapl, start, end).await?;
//! ```
#![warn(missing_docs)]

pub(crate) mod core;
mod fill;
mod range;
mod util;

pub use crate::core::{Tranche, TrancheBuilder};
pub use util::with_request_deadline;

pub use tranche_middleware::{MemoryStore, RetryingUpstream};

// Re-export core types for convenience
pub use tranche_core::{
    BackoffConfig, Bucket, BucketFill, BucketSource, BucketWidth, CacheStore, Clock, KeySpace,
    PricePoint, RangeReport, Series, SystemClock, Ticker, TrancheConfig, TrancheError, TtlPolicy,
    UpstreamFetch, bucket_containing, buckets_overlapping, key_for,
};
