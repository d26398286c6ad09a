//! Data transfer objects, configuration primitives and the unified error type
//! shared by every tranche crate.
#![warn(missing_docs)]

mod config;
mod error;
mod price;
mod reports;
mod ticker;

pub use config::{
    BackoffConfig, DEFAULT_BUCKET_WIDTH, DEFAULT_CLOSED_BUCKET_TTL, DEFAULT_MAX_BUCKETS_PER_QUERY,
    DEFAULT_OPEN_BUCKET_TTL, TrancheConfig,
};
pub use error::TrancheError;
pub use price::{PricePoint, Series};
pub use reports::{BucketFill, BucketSource, RangeReport};
pub use ticker::Ticker;
