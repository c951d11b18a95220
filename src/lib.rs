#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # Circuit Breaking in Rust
//!
//! sentinel-circuit protects callers of unreliable operations. Every operation is guarded by a
//! named `Circuit` which admits or rejects calls from the error statistics of its rolling window,
//! and a `Command` runs the operation with a timeout, degrading to a fallback when the circuit
//! rejects the call or the call fails.
//!
//! Generally, there are several steps when using sentinel-circuit:
//! 1. Add dependancy and optionally initialize the global configurations.
//! 2. Build a `Circuit` for every operation to be protected, and share it with an `Arc`.
//! 3. Run the operation through a `Command`, together with its fallback.
//!
//! ## Add Dependency
//!
//! Add the dependency in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sentinel-circuit = { version = "0.1.0", features = ["logger_env"] }
//! ```
//!
//! Optional features lists:
//! - logger_env: Use `env_logger` to initialize logging.
//! - logger_log4rs: Use `log4rs` to initialize logging.
//!
//! ## General Configurations and Initialization
//!
//! The `api` module provides following interfaces:
//!
//! - `init_default()`: Load configurations from environment variable. For undefined configurations, use default values.
//! - `init_with_config_file(config_path: &mut String)`: Load configurations from a YAML file.
//! - `init_with_config(config_entity: ConfigEntity)`: Use hand-crafted `ConfigEntity` to initialize.
//!
//! ## Circuit and Command
//!
//! ```rust
//! use sentinel_circuit::{circuitbreaker::CircuitConfig, command::Command, new_circuit, Error};
//!
//! async fn query() -> sentinel_circuit::Result<String> {
//!     let circuit = new_circuit("query", CircuitConfig::default())?;
//!     Command::new(circuit)
//!         .execute(
//!             || async { Err(Error::msg("backend down")) },
//!             |_err| Ok("cached".to_owned()),
//!         )
//!         .await
//! }
//! ```
//!
//! A failing fallback is returned as an `Error` wrapping `base::CommandError::Fallback`.
//!
//! ## Harness
//!
//! `harness::Harness` runs a batch of commands under a `isolation::ConcurrencyLimiter`
//! and tallies their outcomes, see `demos/hystrix.rs`.

/// sentinel-circuit API
pub mod api;
/// Core implementations, including the rolling window statistics, the circuit breaker,
/// the command executor, the concurrency limiter and the harness driving them.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
// Utility functions.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
