use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tranche workspace.
///
/// Only `InvalidRange`, `InvalidArg`, `Upstream` and `Cancelled` ever reach a
/// range query caller. The cache variants describe failures of the external
/// store or of the cached payload; they are logged and reported as warnings,
/// never returned from a range query.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrancheError {
    /// The requested half-open range is empty or inverted (`end <= start`).
    #[error("invalid range: end {end} must be after start {start}")]
    InvalidRange {
        /// Requested inclusive start.
        start: DateTime<Utc>,
        /// Requested exclusive end.
        end: DateTime<Utc>,
    },

    /// Invalid input argument (malformed ticker, bad configuration, etc.).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The upstream price source failed or returned malformed data.
    #[error("upstream {upstream} failed: {msg}")]
    Upstream {
        /// Name of the upstream collaborator that failed.
        upstream: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The query was cancelled by the caller or exceeded its deadline.
    #[error("request cancelled: {reason}")]
    Cancelled {
        /// Why the request stopped (caller signal, deadline, ...).
        reason: String,
    },

    /// Reading from the cache store failed.
    #[error("cache read failed: {0}")]
    CacheRead(String),

    /// Writing to the cache store failed.
    #[error("cache write failed: {0}")]
    CacheWrite(String),

    /// A cached payload could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),
}

impl TrancheError {
    /// Helper: build an `InvalidRange` error from the offending bounds.
    #[must_use]
    pub const fn invalid_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::InvalidRange { start, end }
    }

    /// Helper: build an `Upstream` error with the upstream name and message.
    pub fn upstream(upstream: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Upstream {
            upstream: upstream.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build the `Upstream` error used when a single upstream call
    /// exceeds its timeout.
    pub fn upstream_timeout(upstream: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Upstream {
            upstream: upstream.into(),
            msg: format!("timed out after {}ms", timeout.as_millis()),
        }
    }

    /// Helper: build a `Cancelled` error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Returns true if the caller sent a bad request.
    ///
    /// HTTP layers map these to a 4xx status; everything else is a server or
    /// upstream problem.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRange { .. } | Self::InvalidArg(_))
    }

    /// Returns true if this error originated in the upstream price source.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }

    /// Returns true if the request was cancelled or hit its deadline.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns true for the non-fatal cache failures that degrade a query to
    /// "no caching" instead of failing it.
    #[must_use]
    pub const fn is_cache_failure(&self) -> bool {
        matches!(
            self,
            Self::CacheRead(_) | Self::CacheWrite(_) | Self::Codec(_)
        )
    }
}
