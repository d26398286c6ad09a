use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use tranche::{
    BackoffConfig, MemoryStore, RetryingUpstream, Tranche, TrancheBuilder, UpstreamFetch,
};
use tranche_mock::MockUpstream;

/// Simulated vendor latency, overridable with `TRANCHE_DEMO_LATENCY_MS`.
#[must_use]
pub fn upstream_latency() -> Duration {
    let ms = std::env::var("TRANCHE_DEMO_LATENCY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(25);
    Duration::from_millis(ms)
}

/// Return an upstream for demos: the fixture mock behind a slow link, wrapped
/// in the retrying middleware.
#[must_use]
pub fn get_upstream() -> Arc<dyn UpstreamFetch> {
    let raw: Arc<dyn UpstreamFetch> = Arc::new(MockUpstream::with_latency(upstream_latency()));
    Arc::new(RetryingUpstream::new(raw, BackoffConfig::default()))
}

/// A builder pre-wired with the demo upstream and an in-process store.
#[must_use]
pub fn demo_builder() -> TrancheBuilder {
    Tranche::builder()
        .with_upstream(get_upstream())
        .with_store(Arc::new(MemoryStore::new(100_000)))
}

/// Midnight UTC on the given calendar day, or `None` if it does not exist.
#[must_use]
pub fn midnight(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Random midnight between 2010 and 2022 (days 1..=27, so every month works).
pub fn random_date(rng: &mut impl Rng) -> DateTime<Utc> {
    loop {
        let y = rng.random_range(2010..2023);
        let m = rng.random_range(1..13);
        let d = rng.random_range(1..28);
        if let Some(t) = midnight(y, m, d) {
            return t;
        }
    }
}
