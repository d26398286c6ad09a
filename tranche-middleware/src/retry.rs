use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tranche_core::{BackoffConfig, PricePoint, Ticker, TrancheError, UpstreamFetch};

/// Add up to `jitter_percent` of `base_ms` as random jitter.
///
/// The result always lies in `base_ms..=base_ms + base_ms * jitter_percent / 100`.
#[must_use]
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100)
    };
    let mut rng = rand::rng();
    base_ms.saturating_add(rng.random_range(0..jitter_range))
}

/// Upstream wrapper that retries failed fetches with exponential backoff.
///
/// Only `Upstream` errors are retried; anything else (for example a
/// cancellation) is returned immediately. After `max_attempts` failures the
/// last upstream error is returned unchanged.
pub struct RetryingUpstream {
    inner: Arc<dyn UpstreamFetch>,
    backoff: BackoffConfig,
}

impl RetryingUpstream {
    /// Wrap `inner` with the given backoff policy.
    #[must_use]
    pub fn new(inner: Arc<dyn UpstreamFetch>, backoff: BackoffConfig) -> Self {
        Self { inner, backoff }
    }

    /// Access the wrapped upstream.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn UpstreamFetch> {
        &self.inner
    }

    /// The backoff policy in effect.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }
}

#[async_trait]
impl UpstreamFetch for RetryingUpstream {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_range(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError> {
        let max_attempts = self.backoff.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match self.inner.fetch_range(ticker, start, end).await {
                Ok(points) => return Ok(points),
                Err(e) if e.is_upstream() && attempt < max_attempts => {
                    let delay_ms = jitter_wait(
                        self.backoff.base_delay_ms(attempt),
                        u32::from(self.backoff.jitter_percent),
                    );
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        upstream = self.inner.name(),
                        ticker = %ticker,
                        attempt,
                        delay_ms,
                        error = %e,
                        "upstream fetch failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
