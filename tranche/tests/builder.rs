mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use tranche::{Tranche, TrancheConfig, TrancheError, key_for};
use tranche_mock::{MapStore, MockUpstream};

fn assert_invalid_arg(res: Result<Tranche, TrancheError>, needle: &str) {
    match res {
        Err(TrancheError::InvalidArg(msg)) => assert!(msg.contains(needle), "{msg}"),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("expected InvalidArg containing {needle:?}"),
    }
}

#[test]
fn upstream_and_store_are_required() {
    assert_invalid_arg(
        Tranche::builder()
            .with_store(Arc::new(MapStore::new()))
            .build(),
        "upstream",
    );
    assert_invalid_arg(
        Tranche::builder()
            .with_upstream(Arc::new(MockUpstream::new()))
            .build(),
        "store",
    );
}

#[test]
fn bucket_width_must_be_whole_positive_seconds() {
    let base = || {
        Tranche::builder()
            .with_upstream(Arc::new(MockUpstream::new()))
            .with_store(Arc::new(MapStore::new()))
    };
    assert_invalid_arg(base().bucket_width(Duration::ZERO).build(), "positive");
    assert_invalid_arg(
        base().bucket_width(Duration::from_millis(1_500)).build(),
        "whole",
    );
    assert!(base().bucket_width(Duration::from_secs(1)).build().is_ok());
}

#[test]
fn concurrency_must_be_positive() {
    assert_invalid_arg(
        tranche_over(Arc::new(MockUpstream::new()), Arc::new(MapStore::new()))
            .max_concurrent_buckets(0)
            .build(),
        "max_concurrent_buckets",
    );
}

#[test]
fn bucket_cap_must_be_positive() {
    assert_invalid_arg(
        tranche_over(Arc::new(MockUpstream::new()), Arc::new(MapStore::new()))
            .max_buckets_per_query(0)
            .build(),
        "max_buckets_per_query",
    );
}

#[test]
fn namespace_must_be_usable_in_keys() {
    for ns in ["", "a:b"] {
        assert_invalid_arg(
            tranche_over(Arc::new(MockUpstream::new()), Arc::new(MapStore::new()))
                .key_namespace(ns)
                .build(),
            "namespace",
        );
    }
}

#[test]
fn defaults_match_documented_config() {
    let t = Tranche::builder()
        .with_upstream(Arc::new(MockUpstream::new()))
        .with_store(Arc::new(MapStore::new()))
        .build()
        .unwrap();
    assert_eq!(t.config(), &TrancheConfig::default());
    assert_eq!(t.bucket_width().as_secs(), 7 * 86_400);
    assert_eq!(t.key_space().namespace(), None);
}

#[test]
fn setters_land_in_config() {
    let t = tranche_over(Arc::new(MockUpstream::new()), Arc::new(MapStore::new()))
        .bucket_width(Duration::from_secs(86_400))
        .open_bucket_ttl(Duration::from_secs(1))
        .closed_bucket_ttl(Duration::from_secs(2))
        .max_concurrent_buckets(16)
        .upstream_timeout(Duration::from_secs(3))
        .request_timeout(Duration::from_secs(4))
        .key_namespace("v2")
        .build()
        .unwrap();
    let cfg = t.config();
    assert_eq!(cfg.bucket_width, Duration::from_secs(86_400));
    assert_eq!(cfg.open_bucket_ttl, Duration::from_secs(1));
    assert_eq!(cfg.closed_bucket_ttl, Duration::from_secs(2));
    assert_eq!(cfg.max_concurrent_buckets, 16);
    assert_eq!(cfg.upstream_timeout, Some(Duration::from_secs(3)));
    assert_eq!(cfg.request_timeout, Some(Duration::from_secs(4)));
    assert_eq!(cfg.key_namespace.as_deref(), Some("v2"));
}

#[test]
fn whole_config_can_be_supplied() {
    let cfg = TrancheConfig {
        max_concurrent_buckets: 2,
        key_namespace: Some("batch".into()),
        ..TrancheConfig::default()
    };
    let t = tranche_over(Arc::new(MockUpstream::new()), Arc::new(MapStore::new()))
        .config(cfg.clone())
        .build()
        .unwrap();
    assert_eq!(t.config(), &cfg);
}

#[tokio::test]
async fn namespace_prefixes_stored_keys() {
    let store = Arc::new(MapStore::new());
    let t = tranche_over(Arc::new(MockUpstream::new()), store.clone())
        .key_namespace("w7")
        .build()
        .unwrap();
    t.get_range(&aapl(), day(7), day(14)).await.unwrap();
    assert_eq!(
        store.keys().await,
        vec![format!("w7:{}", key_for(&aapl(), &week_of(day(7))))]
    );
}
