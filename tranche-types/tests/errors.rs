use chrono::{TimeZone, Utc};
use tranche_types::TrancheError;

#[test]
fn caller_errors_are_distinguished_from_infrastructure() {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(TrancheError::invalid_range(t, t).is_caller_error());
    assert!(TrancheError::InvalidArg("bad".into()).is_caller_error());

    let up = TrancheError::upstream("yahoo", "503");
    assert!(!up.is_caller_error());
    assert!(up.is_upstream());

    assert!(TrancheError::cancelled("deadline").is_cancelled());
}

#[test]
fn cache_failures_are_flagged_non_fatal() {
    for e in [
        TrancheError::CacheRead("down".into()),
        TrancheError::CacheWrite("down".into()),
        TrancheError::Codec("garbage".into()),
    ] {
        assert!(e.is_cache_failure(), "{e:?}");
        assert!(!e.is_caller_error());
    }
    assert!(!TrancheError::upstream("u", "x").is_cache_failure());
}

#[test]
fn upstream_timeout_is_an_upstream_error() {
    let e = TrancheError::upstream_timeout("slow", std::time::Duration::from_millis(250));
    assert!(e.is_upstream());
    assert_eq!(e.to_string(), "upstream slow failed: timed out after 250ms");
}

#[test]
fn errors_roundtrip_through_serde() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let e = TrancheError::invalid_range(t, t);
    let json = serde_json::to_string(&e).unwrap();
    let de: TrancheError = serde_json::from_str(&json).unwrap();
    assert_eq!(de, e);
}
