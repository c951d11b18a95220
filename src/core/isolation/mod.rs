//! Concurrency isolation of command executions.

pub mod limiter;

pub use limiter::*;
