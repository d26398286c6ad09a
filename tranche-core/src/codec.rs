//! Versioned serialization of cached bucket series.
//!
//! Cached bytes are a JSON envelope:
//!
//! ```text
//! {"v":1,"ticker":"AAPL","points":[{"timestamp":"2024-01-02T00:00:00Z", ...}, ...]}
//! ```
//!
//! Timestamps are RFC 3339 in UTC with full sub-second precision and floats
//! are written in shortest round-trip form, so decoding yields exactly the
//! series that was encoded. Any payload whose `v` differs from
//! [`CODEC_VERSION`] is rejected; callers treat that as a cache miss.

use serde::{Deserialize, Serialize};
use tranche_types::{PricePoint, Series, Ticker, TrancheError};

/// Current envelope version.
pub const CODEC_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    ticker: &'a Ticker,
    points: &'a [PricePoint],
}

#[derive(Deserialize)]
struct Envelope {
    v: u32,
    ticker: Ticker,
    points: Vec<PricePoint>,
}

/// Encode a series into cache bytes.
///
/// # Errors
/// Returns `Codec` if any point carries a non-finite number, which JSON
/// cannot represent losslessly.
pub fn encode_series(series: &Series) -> Result<Vec<u8>, TrancheError> {
    if let Some(bad) = series.iter().find(|p| !p.is_finite()) {
        return Err(TrancheError::Codec(format!(
            "non-finite value in {} point at {}",
            bad.ticker, bad.timestamp
        )));
    }
    let envelope = EnvelopeRef {
        v: CODEC_VERSION,
        ticker: series.ticker(),
        points: series.points(),
    };
    serde_json::to_vec(&envelope).map_err(|e| TrancheError::Codec(e.to_string()))
}

/// Decode cache bytes produced by [`encode_series`].
///
/// # Errors
/// Returns `Codec` for malformed JSON, a missing or unsupported version tag,
/// or invalid field values. Points tagged with a ticker other than the
/// envelope's are dropped.
pub fn decode_series(bytes: &[u8]) -> Result<Series, TrancheError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| TrancheError::Codec(e.to_string()))?;
    if envelope.v != CODEC_VERSION {
        return Err(TrancheError::Codec(format!(
            "unsupported payload version {} (expected {CODEC_VERSION})",
            envelope.v
        )));
    }
    Ok(Series::from_points(envelope.ticker, envelope.points))
}
