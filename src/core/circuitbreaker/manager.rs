use super::{Circuit, CircuitConfig};
use crate::{
    config, logging,
    utils::{Clock, SystemClock},
    Error, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// `CircuitManager` keeps circuits by name, so that callers configure
/// a circuit once and look it up on every call.
#[derive(Debug)]
pub struct CircuitManager {
    default_config: CircuitConfig,
    clock: Arc<dyn Clock>,
    circuits: RwLock<HashMap<String, Arc<Circuit>>>,
}

impl Default for CircuitManager {
    fn default() -> Self {
        CircuitManager::new(config::default_circuit_config())
    }
}

impl CircuitManager {
    pub fn new(default_config: CircuitConfig) -> Self {
        Self::with_clock(default_config, Arc::new(SystemClock))
    }

    pub fn with_clock(default_config: CircuitConfig, clock: Arc<dyn Clock>) -> Self {
        CircuitManager {
            default_config,
            clock,
            circuits: RwLock::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn default_config(&self) -> &CircuitConfig {
        &self.default_config
    }

    /// `create_circuit` builds and registers a circuit, `None` takes the manager's default config.
    /// Registering an existing name is an error, the existing circuit is kept.
    pub fn create_circuit(&self, name: &str, config: Option<CircuitConfig>) -> Result<Arc<Circuit>> {
        let mut circuits = self
            .circuits
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if circuits.contains_key(name) {
            return Err(Error::msg(format!("circuit {} already exists", name)));
        }
        let config = config.unwrap_or_else(|| self.default_config.clone());
        let circuit = Arc::new(Circuit::with_clock(name, config, Arc::clone(&self.clock))?);
        logging::info!(
            "[CircuitManager] circuit {} created, config: {:?}",
            name,
            circuit.config()
        );
        circuits.insert(name.to_owned(), Arc::clone(&circuit));
        Ok(circuit)
    }

    pub fn get_or_create(&self, name: &str) -> Result<Arc<Circuit>> {
        if let Some(circuit) = self.get(name) {
            return Ok(circuit);
        }
        match self.create_circuit(name, None) {
            Ok(circuit) => Ok(circuit),
            // lost a creation race, the winner is registered now
            Err(err) => self.get(name).ok_or(err),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Circuit>> {
        self.circuits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn circuit_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .circuits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
