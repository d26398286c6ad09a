//! tranche-middleware
//!
//! Ready-made collaborators for the range cache:
//!
//! - [`MemoryStore`]: an in-process [`CacheStore`](tranche_core::CacheStore)
//!   honouring per-entry TTLs, for single-node deployments and tests.
//! - [`RetryingUpstream`]: wraps any [`UpstreamFetch`](tranche_core::UpstreamFetch)
//!   and retries upstream failures with exponential backoff and jitter. The
//!   range cache itself never retries, so this is where retry policy lives.
#![warn(missing_docs)]

mod memory;
mod retry;

pub use crate::memory::MemoryStore;
pub use crate::retry::{RetryingUpstream, jitter_wait};
