mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use tranche::TrancheError;
use tranche_mock::{CountingStore, DynamicMockUpstream, MapStore, MockBehavior, MockUpstream};

#[tokio::test(start_paused = true)]
async fn request_deadline_cancels_hung_upstream() {
    let (upstream, ctl) = DynamicMockUpstream::new_with_controller("dyn");
    ctl.set_behavior(aapl(), MockBehavior::Hang).await;
    let t = tranche_over(upstream, Arc::new(MapStore::new()))
        .request_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = t.get_range(&aapl(), day(0), day(14)).await.unwrap_err();
    assert!(err.is_cancelled(), "{err:?}");
    assert!(!err.is_caller_error());
}

#[tokio::test(start_paused = true)]
async fn caller_signal_cancels_query() {
    let (upstream, ctl) = DynamicMockUpstream::new_with_controller("dyn");
    ctl.set_behavior(aapl(), MockBehavior::Hang).await;
    let t = tranche_over(upstream, Arc::new(MapStore::new()))
        .build()
        .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = tx.send(());
    });
    let cancel = async {
        let _ = rx.await;
    };

    let err = t
        .get_range_until(&aapl(), day(0), day(14), cancel)
        .await
        .unwrap_err();
    assert_eq!(err, TrancheError::cancelled("cancelled by caller"));
}

#[tokio::test]
async fn unfired_signal_does_not_interfere() {
    let h = harness();
    let series = h
        .tranche
        .get_range_until(&aapl(), day(0), day(7), std::future::pending())
        .await
        .unwrap();
    assert_eq!(series.len(), 7);
}

#[tokio::test]
async fn invalid_range_wins_over_cancellation() {
    let h = harness();
    let err = h
        .tranche
        .get_range_until(&aapl(), day(7), day(0), async {})
        .await
        .unwrap_err();
    assert!(matches!(err, TrancheError::InvalidRange { .. }));
}

#[tokio::test(start_paused = true)]
async fn cache_write_completes_after_cancellation() {
    let map = Arc::new(MapStore::new());
    let counting = Arc::new(CountingStore::new(map.clone()).with_set_delay(Duration::from_millis(200)));
    let t = tranche_over(Arc::new(MockUpstream::new()), counting.clone())
        .request_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = t.get_range(&aapl(), day(7), day(14)).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(map.is_empty().await, "write still in flight");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(counting.sets(), 1);
    assert_eq!(map.len().await, 1);

    // The next query is a pure cache hit.
    let quick = tranche_over(Arc::new(MockUpstream::new()), map.clone())
        .build()
        .unwrap();
    let report = quick.get_range_report(&aapl(), day(7), day(14)).await.unwrap();
    assert_eq!(report.cache_hits(), 1);
}

#[tokio::test(start_paused = true)]
async fn upstream_timeout_is_an_upstream_error() {
    let (upstream, ctl) = DynamicMockUpstream::new_with_controller("dyn");
    ctl.set_behavior(aapl(), MockBehavior::Hang).await;
    let t = tranche_over(upstream, Arc::new(MapStore::new()))
        .upstream_timeout(Duration::from_millis(100))
        .request_timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let err = t.get_range(&aapl(), day(0), day(7)).await.unwrap_err();
    assert_eq!(
        err,
        TrancheError::upstream_timeout("dyn", Duration::from_millis(100))
    );
    assert!(err.to_string().contains("timed out after 100ms"));
}

#[tokio::test(start_paused = true)]
async fn slow_but_timely_upstream_succeeds() {
    let (upstream, ctl) = DynamicMockUpstream::new_with_controller("dyn");
    ctl.set_delay_at(aapl(), day(0), Duration::from_millis(80)).await;
    let t = tranche_over(upstream, Arc::new(MapStore::new()))
        .upstream_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    assert_eq!(t.get_range(&aapl(), day(0), day(7)).await.unwrap().len(), 7);
}
