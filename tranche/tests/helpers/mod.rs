#![allow(dead_code)]
// Shared fixtures so tests can `use helpers::*;`

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tranche::{Bucket, BucketWidth, CacheStore, Ticker, Tranche, UpstreamFetch, bucket_containing};
use tranche_mock::{FixedClock, MapStore, MockUpstream};

pub use tranche_mock::day;

pub const WEEK: Duration = Duration::from_secs(7 * 86_400);

pub fn aapl() -> Ticker {
    Ticker::new("AAPL").unwrap()
}

pub fn msft() -> Ticker {
    Ticker::new("MSFT").unwrap()
}

pub fn weekly() -> BucketWidth {
    BucketWidth::from_duration(WEEK).unwrap()
}

pub fn week_of(t: DateTime<Utc>) -> Bucket {
    bucket_containing(t, weekly()).unwrap()
}

/// Everything a test needs to poke at a `Tranche` wired to mocks.
pub struct Harness {
    pub tranche: Tranche,
    pub upstream: Arc<MockUpstream>,
    pub store: Arc<MapStore>,
    pub clock: Arc<FixedClock>,
}

/// Weekly buckets over the fixture upstream and a map store, with the clock
/// parked far in the future so every test bucket is closed.
pub fn harness() -> Harness {
    harness_with(|b| b)
}

pub fn harness_with(
    f: impl FnOnce(tranche::TrancheBuilder) -> tranche::TrancheBuilder,
) -> Harness {
    let upstream = Arc::new(MockUpstream::new());
    let store = Arc::new(MapStore::new());
    let clock = Arc::new(FixedClock::new(day(10_000)));
    let builder = Tranche::builder()
        .with_upstream(upstream.clone() as Arc<dyn UpstreamFetch>)
        .with_store(store.clone() as Arc<dyn CacheStore>)
        .with_clock(clock.clone())
        .bucket_width(WEEK);
    let tranche = f(builder).build().unwrap();
    Harness {
        tranche,
        upstream,
        store,
        clock,
    }
}

/// A `Tranche` over arbitrary collaborators with weekly buckets.
pub fn tranche_over(
    upstream: Arc<dyn UpstreamFetch>,
    store: Arc<dyn CacheStore>,
) -> tranche::TrancheBuilder {
    Tranche::builder()
        .with_upstream(upstream)
        .with_store(store)
        .with_clock(Arc::new(FixedClock::new(day(10_000))))
        .bucket_width(WEEK)
}
