//! Price points and ordered series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticker::Ticker;

/// One OHLCV observation for a ticker.
///
/// Produced by an upstream source or decoded from a cached bucket; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation time (UTC, sub-second precision preserved).
    pub timestamp: DateTime<Utc>,
    /// Ticker this observation belongs to.
    pub ticker: Ticker,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Close adjusted for splits and dividends.
    pub adjusted_close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl PricePoint {
    /// True when every numeric field is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.adjusted_close.is_finite()
            && self.volume.is_finite()
    }
}

/// Chronologically ordered price points for exactly one ticker.
///
/// Invariants: timestamps are strictly increasing (sorted, no duplicates) and
/// every point carries the series ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSeries")]
pub struct Series {
    ticker: Ticker,
    points: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct RawSeries {
    ticker: Ticker,
    points: Vec<PricePoint>,
}

impl From<RawSeries> for Series {
    fn from(raw: RawSeries) -> Self {
        Self::from_points(raw.ticker, raw.points)
    }
}

impl Series {
    /// An empty series for `ticker`.
    #[must_use]
    pub const fn empty(ticker: Ticker) -> Self {
        Self {
            ticker,
            points: Vec::new(),
        }
    }

    /// Build a series from points in any order.
    ///
    /// Points for any other ticker are dropped. The rest are sorted by
    /// timestamp; for duplicate timestamps the first occurrence wins. Input
    /// that is already strictly increasing is kept as is.
    #[must_use]
    pub fn from_points(ticker: Ticker, mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.ticker == ticker);
        Self {
            ticker,
            points: normalize(points),
        }
    }

    /// Concatenate per-bucket series that were visited in chronological order.
    ///
    /// When the parts do not overlap this is a plain append. Overlapping or
    /// out-of-order parts are re-sorted with first-wins de-duplication so the
    /// series invariant always holds.
    #[must_use]
    pub fn concat<I>(ticker: Ticker, parts: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut points = Vec::new();
        for part in parts {
            points.extend(part.points);
        }
        Self::from_points(ticker, points)
    }

    /// Keep only points with `start <= timestamp < end`.
    pub fn retain_within(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.points
            .retain(|p| start <= p.timestamp && p.timestamp < end);
    }

    /// Ticker this series belongs to.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// The ordered points.
    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Consume the series, returning its ordered points.
    #[must_use]
    pub fn into_points(self) -> Vec<PricePoint> {
        self.points
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the ordered points.
    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn normalize(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    if points.windows(2).all(|w| w[0].timestamp < w[1].timestamp) {
        return points;
    }
    // stable sort keeps the first occurrence ahead of later duplicates
    points.sort_by_key(|p| p.timestamp);
    points.dedup_by(|later, kept| later.timestamp == kept.timestamp);
    points
}
