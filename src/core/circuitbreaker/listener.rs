use super::State;
use crate::stat::WindowSnapshot;

/// `StateChangeListener` listens on the circuit breaker state change event.
/// Listeners are invoked after the circuit has released its state lock,
/// so they may freely query the circuit.
pub trait StateChangeListener: Sync + Send {
    /// `on_transform_to_closed` is triggered when circuit breaker state transformed to Closed.
    fn on_transform_to_closed(&self, prev: State, circuit: &str);

    /// `on_transform_to_open` is triggered when circuit breaker state transformed to Open.
    /// The "snapshot" holds the window statistics when the transformation occurs.
    fn on_transform_to_open(&self, prev: State, circuit: &str, snapshot: WindowSnapshot);

    /// `on_transform_to_half_open` is triggered when circuit breaker state transformed to HalfOpen.
    fn on_transform_to_half_open(&self, prev: State, circuit: &str);
}
