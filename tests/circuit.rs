use sentinel_circuit::{
    circuitbreaker::{Circuit, CircuitConfig, CircuitManager, State, StateChangeListener},
    command::Command,
    stat::WindowSnapshot,
    utils::{Clock, ManualClock},
    Error,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct TransitionRecorder {
    transitions: Mutex<Vec<(State, State)>>,
}

impl TransitionRecorder {
    fn transitions(&self) -> Vec<(State, State)> {
        self.transitions.lock().unwrap().clone()
    }
}

impl StateChangeListener for TransitionRecorder {
    fn on_transform_to_closed(&self, prev: State, _circuit: &str) {
        self.transitions.lock().unwrap().push((prev, State::Closed));
    }

    fn on_transform_to_open(&self, prev: State, _circuit: &str, snapshot: WindowSnapshot) {
        assert!(snapshot.attempts >= snapshot.successes + snapshot.failures);
        self.transitions.lock().unwrap().push((prev, State::Open));
    }

    fn on_transform_to_half_open(&self, prev: State, _circuit: &str) {
        self.transitions.lock().unwrap().push((prev, State::HalfOpen));
    }
}

#[tokio::test]
async fn full_cycle_through_commands() {
    let clock = Arc::new(ManualClock::new(0));
    let manager = CircuitManager::with_clock(
        CircuitConfig {
            request_volume_threshold: 4,
            error_threshold_percentage: 50,
            sleep_window_ms: 3,
            ..Default::default()
        },
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let circuit = manager.get_or_create("cycle").unwrap();
    let recorder = Arc::new(TransitionRecorder::default());
    circuit.register_state_change_listeners(vec![recorder.clone() as Arc<dyn StateChangeListener>]);
    let command = Command::new(Arc::clone(&circuit));

    for _ in 0..4 {
        let value = command
            .execute(|| async { Err(Error::msg("down")) }, |_| Ok(0))
            .await
            .unwrap();
        assert_eq!(value, 0);
    }
    assert_eq!(circuit.state(), State::Open);

    // a failed probe re-opens
    clock.advance(3);
    command
        .execute(|| async { Err::<i32, _>(Error::msg("down")) }, |_| Ok(0))
        .await
        .unwrap();
    assert_eq!(circuit.state(), State::Open);

    clock.advance(3);
    let value = command
        .execute(|| async { Ok(1) }, |_| Ok(0))
        .await
        .unwrap();
    assert_eq!(value, 1);
    assert_eq!(circuit.state(), State::Closed);

    assert_eq!(
        recorder.transitions(),
        vec![
            (State::Closed, State::Open),
            (State::Open, State::HalfOpen),
            (State::HalfOpen, State::Open),
            (State::Open, State::HalfOpen),
            (State::HalfOpen, State::Closed),
        ]
    );
}

#[test]
fn probe_is_exclusive_across_threads() {
    let clock = Arc::new(ManualClock::new(0));
    let config = CircuitConfig {
        request_volume_threshold: 1,
        sleep_window_ms: 3,
        ..Default::default()
    };
    let circuit = Arc::new(
        Circuit::with_clock("exclusive", config, Arc::clone(&clock) as Arc<dyn Clock>).unwrap(),
    );
    let command = Command::new(Arc::clone(&circuit));
    command
        .execute_blocking(|| Err::<(), _>(Error::msg("down")), |_| Ok(()))
        .unwrap();
    assert!(circuit.is_open());
    clock.advance(3);

    let probe = circuit.try_admit().unwrap();
    let handlers: Vec<_> = (0..8)
        .map(|_| {
            let circuit = Arc::clone(&circuit);
            std::thread::spawn(move || circuit.try_admit().is_err())
        })
        .collect();
    for h in handlers {
        assert!(h.join().expect("Couldn't join on the associated thread"));
    }
    probe.succeed();
    assert_eq!(circuit.state(), State::Closed);
}
