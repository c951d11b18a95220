//! Primary and fallback execution under a circuit.

pub mod executor;

pub use executor::*;
