//! Mock collaborators for CI-safe tests and demos.
//!
//! - [`MockUpstream`]: deterministic daily fixture prices for a handful of tickers.
//! - [`DynamicMockUpstream`]: behavior scripted per ticker or per bucket via a controller.
//! - [`MapStore`], [`UnavailableStore`], [`CountingStore`]: cache stores for
//!   inspecting and breaking the cache path.
//! - [`FixedClock`]: a settable clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tranche_core::{PricePoint, Ticker, TrancheError, UpstreamFetch};

mod clock;
mod dynamic;
mod store;

pub use clock::FixedClock;
pub use dynamic::{DynamicMockController, DynamicMockUpstream, MockBehavior};
pub use store::{CountingStore, MapStore, UnavailableStore};

const DAY_SECS: i64 = 86_400;

/// Tickers the fixture generator knows about, with their base price.
pub const FIXTURE_TICKERS: &[(&str, f64)] = &[
    ("AAPL", 150.0),
    ("MSFT", 300.0),
    ("GOOG", 130.0),
    ("TSLA", 200.0),
];

/// One recorded upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Requested ticker.
    pub ticker: Ticker,
    /// Requested inclusive start.
    pub start: DateTime<Utc>,
    /// Requested exclusive end.
    pub end: DateTime<Utc>,
}

/// Mock upstream serving one deterministic point per day at 00:00 UTC.
///
/// The ticker `FAIL` always returns a forced upstream error; any other ticker
/// outside [`FIXTURE_TICKERS`] fails as unknown.
pub struct MockUpstream {
    latency: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpstream {
    /// Mock that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            latency: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock that waits `latency` before every answer, imitating a slow vendor.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `fetch_range` calls so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of the request log in call order.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().await.clone()
    }

    /// Fixture points for `ticker` in `[start, end)` without touching counters.
    ///
    /// # Errors
    /// Returns an upstream error for tickers without fixture data.
    pub fn fixture(
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError> {
        let base = FIXTURE_TICKERS
            .iter()
            .find(|(sym, _)| *sym == ticker.as_str())
            .map(|(_, base)| *base)
            .ok_or_else(|| {
                TrancheError::upstream("tranche-mock", format!("unknown ticker {ticker}"))
            })?;

        let mut day = start.timestamp().div_euclid(DAY_SECS);
        let mut points = Vec::new();
        loop {
            let Some(ts) = DateTime::from_timestamp(day * DAY_SECS, 0) else {
                break;
            };
            if ts >= end {
                break;
            }
            if ts >= start {
                points.push(fixture_point(ticker, base, day, ts));
            }
            day += 1;
        }
        Ok(points)
    }
}

fn fixture_point(ticker: &Ticker, base: f64, day: i64, ts: DateTime<Utc>) -> PricePoint {
    #[allow(clippy::cast_precision_loss)]
    let wave = (day.rem_euclid(20) - 10) as f64;
    let close = base + wave * 0.75;
    #[allow(clippy::cast_precision_loss)]
    let volume = 1_000_000.0 + (day.rem_euclid(7) * 10_000) as f64;
    PricePoint {
        timestamp: ts,
        ticker: ticker.clone(),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.5,
        close,
        adjusted_close: close * 0.99,
        volume,
    }
}

#[async_trait]
impl UpstreamFetch for MockUpstream {
    fn name(&self) -> &'static str {
        "tranche-mock"
    }

    async fn fetch_range(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(FetchRequest {
            ticker: ticker.clone(),
            start,
            end,
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if ticker.as_str() == "FAIL" {
            return Err(TrancheError::upstream(
                self.name(),
                "forced failure: fetch_range",
            ));
        }
        if end <= start {
            return Ok(Vec::new());
        }
        Self::fixture(ticker, start, end)
    }
}

/// Midnight UTC of the given day counted from the Unix epoch.
///
/// Convenience for tests that reason in whole days.
#[must_use]
pub fn day(n: i64) -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + TimeDelta::days(n)
}
