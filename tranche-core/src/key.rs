//! Cache key derivation.

use tranche_types::Ticker;

use crate::bucket::Bucket;

/// Separator between key components.
pub const KEY_SEPARATOR: char = ':';

/// Cache key for one (ticker, bucket) pair: `"{ticker}:{bucket_start_unix_seconds}"`.
///
/// Injective as long as the ticker does not contain [`KEY_SEPARATOR`]; a
/// validated [`Ticker`] never does. No escaping is performed here.
#[must_use]
pub fn key_for(ticker: &Ticker, bucket: &Bucket) -> String {
    format!("{ticker}{KEY_SEPARATOR}{}", bucket.start().timestamp())
}

/// Key derivation with an optional namespace prefix.
///
/// Deployments that share one store but differ in bucket width or payload
/// generation use distinct namespaces so their keys never alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    namespace: Option<String>,
}

impl KeySpace {
    /// Create a key space; `None` yields plain [`key_for`] keys.
    #[must_use]
    pub const fn new(namespace: Option<String>) -> Self {
        Self { namespace }
    }

    /// Namespace prefix, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Derive the key for one (ticker, bucket) pair.
    #[must_use]
    pub fn key_for(&self, ticker: &Ticker, bucket: &Bucket) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}{KEY_SEPARATOR}{}", key_for(ticker, bucket)),
            None => key_for(ticker, bucket),
        }
    }
}
