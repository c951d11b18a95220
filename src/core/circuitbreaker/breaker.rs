//!  Circuit Breaker State Machine:
//!
//!                      error percentage over threshold with enough volume
//!
//!             +-----------------------------------------------------------------------+
//!             |                                                                       |
//!             |                                                                       v
//!     +----------------+                   +----------------+  sleep window   +----------------+
//!     |                |                   |                |<----------------|                |
//!     |                |   Probe succeed   |                |     elapsed     |                |
//!     |     Closed     |<------------------|    HalfOpen    |                 |      Open      |
//!     |                |                   |                |   Probe failed  |                |
//!     |                |                   |                +---------------->|                |
//!     +----------------+                   +----------------+                 +----------------+
//!
//! The sleep window is checked lazily by the next admission attempt, there is no timer.

use super::{CircuitConfig, StateChangeListener};
use crate::{
    base::CommandError,
    logging,
    stat::{RollingWindow, WindowSnapshot},
    utils::{self, Clock, SystemClock},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// States of Circuit Breaker State Machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Closed,
    HalfOpen,
    Open,
}

impl Default for State {
    fn default() -> State {
        State::Closed
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Default)]
struct CircuitState {
    state: State,
    opened_at_ms: u64,
    /// guards the single probe of the half-open state
    half_open_in_flight: bool,
    /// bumped on every window reset, completions of older admissions are not counted
    epoch: u64,
}

enum Transition {
    ToOpen(State, WindowSnapshot),
    ToHalfOpen(State),
    ToClosed(State),
}

/// `Circuit` guards one named operation.
/// It is shared by every task calling the operation, usually behind an `Arc`.
pub struct Circuit {
    name: String,
    config: CircuitConfig,
    clock: Arc<dyn Clock>,
    window: RollingWindow,
    state: Mutex<CircuitState>,
    listeners: RwLock<Vec<Arc<dyn StateChangeListener>>>,
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .field("window", &self.window_snapshot())
            .finish()
    }
}

impl Circuit {
    pub fn new<S: Into<String>>(name: S, config: CircuitConfig) -> Result<Self> {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    pub fn with_clock<S: Into<String>>(
        name: S,
        config: CircuitConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let name = name.into();
        if utils::is_blank(&name) {
            return Err(Error::msg("empty circuit name"));
        }
        config.is_valid()?;
        let window = RollingWindow::new(clock.now_millis());
        Ok(Circuit {
            name,
            config,
            clock,
            window,
            state: Mutex::new(CircuitState::default()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// `state` returns current state of the circuit breaker.
    pub fn state(&self) -> State {
        self.lock_state().state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state() == State::Open
    }

    pub fn window_snapshot(&self) -> WindowSnapshot {
        let _guard = self.lock_state();
        self.window.snapshot()
    }

    pub fn register_state_change_listeners(&self, listeners: Vec<Arc<dyn StateChangeListener>>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(listeners);
    }

    pub fn clear_state_change_listeners(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[inline]
    fn lock_state(&self) -> MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `try_admit` acquires permission of an invocation only if it is available at the time of invocation.
    /// The admission decision and the state transition it implies are taken under one lock,
    /// so exactly one caller becomes the half-open probe.
    pub fn try_admit(&self) -> std::result::Result<Admission<'_>, CommandError> {
        let now = self.clock.now_millis();
        let mut transition = None;
        let admission = {
            let mut state = self.lock_state();
            match state.state {
                State::Closed => {
                    if self.window.is_expired(now, self.config.rolling_window_ms) {
                        self.window.reset_at(now);
                        state.epoch += 1;
                    }
                    self.window.record_attempt();
                    Some(Admission::new(self, state.epoch, false))
                }
                State::Open => {
                    if now.saturating_sub(state.opened_at_ms) >= self.config.sleep_window_ms {
                        state.state = State::HalfOpen;
                        state.half_open_in_flight = true;
                        transition = Some(Transition::ToHalfOpen(State::Open));
                        self.window.record_attempt();
                        Some(Admission::new(self, state.epoch, true))
                    } else {
                        None
                    }
                }
                State::HalfOpen => {
                    if state.half_open_in_flight {
                        None
                    } else {
                        state.half_open_in_flight = true;
                        self.window.record_attempt();
                        Some(Admission::new(self, state.epoch, true))
                    }
                }
            }
        };
        if let Some(transition) = transition {
            self.notify(transition, now);
        }
        admission.ok_or_else(|| {
            logging::trace!("[Circuit] {} rejected the request", self.name);
            CommandError::circuit_open(&self.name)
        })
    }

    /// `on_request_complete` records a completed admission and handles the state transformation.
    /// It is called exactly once per admission, through `Admission`.
    fn on_request_complete(&self, epoch: u64, probe: bool, success: bool) {
        let now = self.clock.now_millis();
        let transition = {
            let mut state = self.lock_state();
            if epoch == state.epoch {
                if success {
                    self.window.record_success();
                } else {
                    self.window.record_failure();
                }
            } else {
                logging::debug!(
                    "[Circuit] {} discards a completion admitted before the last window reset",
                    self.name
                );
            }

            if probe {
                state.half_open_in_flight = false;
                if state.state != State::HalfOpen {
                    None
                } else if success {
                    state.state = State::Closed;
                    self.window.reset_at(now);
                    state.epoch += 1;
                    Some(Transition::ToClosed(State::HalfOpen))
                } else {
                    state.state = State::Open;
                    state.opened_at_ms = now;
                    Some(Transition::ToOpen(State::HalfOpen, self.window.snapshot()))
                }
            } else if state.state == State::Closed
                && self.window.total_attempts() >= self.config.request_volume_threshold
                && self.window.error_percentage() >= self.config.error_threshold_percentage
            {
                state.state = State::Open;
                state.opened_at_ms = now;
                Some(Transition::ToOpen(State::Closed, self.window.snapshot()))
            } else {
                None
            }
        };
        if let Some(transition) = transition {
            self.notify(transition, now);
        }
    }

    fn notify(&self, transition: Transition, now: u64) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let time = utils::format_time_millis(now);
        match transition {
            Transition::ToOpen(prev, snapshot) => {
                logging::info!(
                    "[Circuit] {} from {} to Open, {}, time: {}",
                    self.name,
                    prev,
                    snapshot,
                    time
                );
                for listener in &listeners {
                    listener.on_transform_to_open(prev, &self.name, snapshot);
                }
            }
            Transition::ToHalfOpen(prev) => {
                logging::info!(
                    "[Circuit] {} from {} to HalfOpen, time: {}",
                    self.name,
                    prev,
                    time
                );
                for listener in &listeners {
                    listener.on_transform_to_half_open(prev, &self.name);
                }
            }
            Transition::ToClosed(prev) => {
                logging::info!(
                    "[Circuit] {} from {} to Closed, time: {}",
                    self.name,
                    prev,
                    time
                );
                for listener in &listeners {
                    listener.on_transform_to_closed(prev, &self.name);
                }
            }
        }
    }
}

/// `Admission` is the permission of one admitted call.
/// Report the call with `succeed()` or `fail()`; an admission dropped
/// without a report is recorded as a failure, so an abandoned probe reopens the circuit.
#[must_use = "an unreported admission is recorded as a failure"]
pub struct Admission<'a> {
    circuit: &'a Circuit,
    epoch: u64,
    probe: bool,
    reported: bool,
}

impl<'a> Admission<'a> {
    fn new(circuit: &'a Circuit, epoch: u64, probe: bool) -> Self {
        Admission {
            circuit,
            epoch,
            probe,
            reported: false,
        }
    }

    /// `is_probe` is true for the trial call of a half-open circuit.
    #[inline]
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn succeed(mut self) {
        self.report(true);
    }

    pub fn fail(mut self) {
        self.report(false);
    }

    fn report(&mut self, success: bool) {
        if !self.reported {
            self.reported = true;
            self.circuit
                .on_request_complete(self.epoch, self.probe, success);
        }
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.reported {
            logging::debug!(
                "[Circuit] {} admission dropped without a report, recorded as failure",
                self.circuit.name
            );
            self.report(false);
        }
    }
}

impl fmt::Debug for Admission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission")
            .field("circuit", &self.circuit.name)
            .field("probe", &self.probe)
            .field("reported", &self.reported)
            .finish()
    }
}
