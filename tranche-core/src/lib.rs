//! tranche-core
//!
//! Building blocks of the bucketed range cache.
//!
//! - `bucket`: epoch-aligned fixed-width buckets and range partitioning.
//! - `key`: stable cache keys per (ticker, bucket).
//! - `ttl`: open/closed lifetime policy.
//! - `codec`: versioned byte encoding of cached series.
//! - `connector`: the `UpstreamFetch` and `CacheStore` collaborator traits.
//! - `clock`: injectable time source.
//!
//! Everything here is synchronous and side-effect free except the async
//! collaborator traits, which are implemented elsewhere.
#![warn(missing_docs)]

/// Epoch-aligned buckets and range partitioning.
pub mod bucket;
/// Time source abstraction.
pub mod clock;
/// Versioned cache payload encoding.
pub mod codec;
/// Upstream and cache-store collaborator traits.
pub mod connector;
/// Cache key derivation.
pub mod key;
/// Open/closed TTL policy.
pub mod ttl;

pub use bucket::{Bucket, BucketWidth, bucket_containing, bucket_count, buckets_overlapping};
pub use clock::{Clock, SystemClock};
pub use codec::{CODEC_VERSION, decode_series, encode_series};
pub use connector::{CacheStore, UpstreamFetch};
pub use key::{KEY_SEPARATOR, KeySpace, key_for};
pub use ttl::TtlPolicy;
pub use tranche_types::*;
