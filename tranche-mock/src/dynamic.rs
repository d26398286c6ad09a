use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tranche_core::{PricePoint, Ticker, TrancheError, UpstreamFetch};

use crate::{FetchRequest, MockUpstream};

/// Instruction for how a fetch should behave.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(TrancheError),
    /// Hang indefinitely (simulate a stalled vendor).
    Hang,
}

type Points = Vec<PricePoint>;

#[derive(Default)]
struct InternalState {
    ticker_rules: HashMap<Ticker, MockBehavior<Points>>,
    start_rules: HashMap<(Ticker, DateTime<Utc>), MockBehavior<Points>>,
    delays: HashMap<(Ticker, DateTime<Utc>), Duration>,
    requests: Vec<FetchRequest>,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for every fetch of `ticker`.
    pub async fn set_behavior(&self, ticker: Ticker, behavior: MockBehavior<Points>) {
        let mut guard = self.state.lock().await;
        guard.ticker_rules.insert(ticker, behavior);
    }

    /// Set the behavior for fetches of `ticker` whose range starts at `start`.
    ///
    /// Takes precedence over [`set_behavior`](Self::set_behavior).
    pub async fn set_behavior_at(
        &self,
        ticker: Ticker,
        start: DateTime<Utc>,
        behavior: MockBehavior<Points>,
    ) {
        let mut guard = self.state.lock().await;
        guard.start_rules.insert((ticker, start), behavior);
    }

    /// Delay fetches of `ticker` starting at `start` by `delay` before answering.
    pub async fn set_delay_at(&self, ticker: Ticker, start: DateTime<Utc>, delay: Duration) {
        let mut guard = self.state.lock().await;
        guard.delays.insert((ticker, start), delay);
    }

    /// Return a copy of the request log in arrival order.
    pub async fn requests(&self) -> Vec<FetchRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Number of fetches received so far.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Clear all configured behaviors, delays and request logs.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.ticker_rules.clear();
        guard.start_rules.clear();
        guard.delays.clear();
        guard.requests.clear();
    }
}

/// An upstream that defers its behavior to an external controller.
///
/// Fetches with no configured behavior are answered from the
/// [`MockUpstream`] fixtures.
pub struct DynamicMockUpstream {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockUpstream {
    /// Create a new dynamic mock upstream and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn UpstreamFetch>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn UpstreamFetch>, controller)
    }
}

#[async_trait]
impl UpstreamFetch for DynamicMockUpstream {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_range(
        &self,
        ticker: &Ticker,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>, TrancheError> {
        // Snapshot behavior without holding the lock across await points
        let (behavior, delay) = {
            let mut guard = self.state.lock().await;
            guard.requests.push(FetchRequest {
                ticker: ticker.clone(),
                start,
                end,
            });
            let key = (ticker.clone(), start);
            let behavior = guard
                .start_rules
                .get(&key)
                .or_else(|| guard.ticker_rules.get(ticker))
                .cloned();
            (behavior, guard.delays.get(&key).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match behavior {
            Some(MockBehavior::Return(points)) => Ok(points),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => MockUpstream::fixture(ticker, start, end),
        }
    }
}
