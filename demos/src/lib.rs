//! Shared plumbing for the runnable demos under `demos/examples/`.

pub mod common;
