use crate::{
    circuitbreaker::{Circuit, CircuitConfig},
    config, Result,
};
use std::sync::Arc;

/// `new_circuit` builds a shareable circuit from the given config.
#[inline]
pub fn new_circuit(name: &str, config: CircuitConfig) -> Result<Arc<Circuit>> {
    Ok(Arc::new(Circuit::new(name, config)?))
}

/// `new_default_circuit` builds a circuit from the global default circuit config.
#[inline]
pub fn new_default_circuit(name: &str) -> Result<Arc<Circuit>> {
    new_circuit(name, config::default_circuit_config())
}
