use std::time::Duration;

use chrono::{DateTime, TimeDelta};
use tranche_core::{BucketWidth, TrancheConfig, TtlPolicy, bucket_containing};

const DAY: i64 = 86_400;

fn bucket() -> tranche_core::Bucket {
    let w = BucketWidth::from_secs(7 * DAY).unwrap();
    bucket_containing(DateTime::from_timestamp(8 * DAY, 0).unwrap(), w).unwrap()
}

#[test]
fn defaults_are_ten_minutes_and_thirty_days() {
    let p = TtlPolicy::default();
    assert_eq!(p.open, Duration::from_secs(600));
    assert_eq!(p.closed, Duration::from_secs(30 * DAY as u64));
    assert_eq!(TtlPolicy::from_config(&TrancheConfig::default()), p);
}

#[test]
fn bucket_in_progress_gets_short_ttl() {
    let p = TtlPolicy::default();
    let b = bucket();
    let now = b.start() + TimeDelta::hours(5);
    assert_eq!(p.ttl_for(&b, now), p.open);
}

#[test]
fn future_bucket_gets_short_ttl() {
    let p = TtlPolicy::default();
    let b = bucket();
    let now = b.start() - TimeDelta::days(3);
    assert_eq!(p.ttl_for(&b, now), p.open);
}

#[test]
fn bucket_in_the_past_gets_long_ttl() {
    let p = TtlPolicy::default();
    let b = bucket();
    let now = b.end() + TimeDelta::nanoseconds(1);
    assert_eq!(p.ttl_for(&b, now), p.closed);
}

#[test]
fn now_equal_to_bucket_end_counts_as_open() {
    // Tie-break: `end >= now` keeps the bucket open, so the boundary instant
    // still gets the short lifetime.
    let p = TtlPolicy::new(Duration::from_secs(1), Duration::from_secs(2));
    let b = bucket();
    assert_eq!(p.ttl_for(&b, b.end()), Duration::from_secs(1));
}
