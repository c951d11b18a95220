//! Circuit breaking of named operations.
//!
//! A `Circuit` admits or rejects each call from the error statistics
//! of its rolling window, see `breaker` for the state machine.

pub mod breaker;
pub mod config;
pub mod listener;
pub mod manager;

pub use breaker::*;
pub use config::*;
pub use listener::*;
pub use manager::*;
