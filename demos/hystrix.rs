use sentinel_circuit::circuitbreaker::{CircuitConfig, State, StateChangeListener};
use sentinel_circuit::harness::{ErrorSchedule, Harness, SimulatedWorkload};
use sentinel_circuit::isolation::ConcurrencyLimiter;
use sentinel_circuit::stat::WindowSnapshot;
use sentinel_circuit::utils::{curr_time_millis, format_time_millis};
use sentinel_circuit::{new_circuit, Result};
use std::sync::Arc;

struct MyStateListener {}

impl StateChangeListener for MyStateListener {
    fn on_transform_to_closed(&self, prev: State, circuit: &str) {
        println!(
            "circuit: {}, From {:?} to Closed, time: {}",
            circuit,
            prev,
            format_time_millis(curr_time_millis())
        )
    }
    fn on_transform_to_open(&self, prev: State, circuit: &str, snapshot: WindowSnapshot) {
        println!(
            "circuit: {}, From {:?} to Open, window: {}, time: {}",
            circuit,
            prev,
            snapshot,
            format_time_millis(curr_time_millis())
        )
    }
    fn on_transform_to_half_open(&self, prev: State, circuit: &str) {
        println!(
            "circuit: {}, From {:?} to Half-Open, time: {}",
            circuit,
            prev,
            format_time_millis(curr_time_millis())
        )
    }
}

async fn replay(
    name: &str,
    config: CircuitConfig,
    schedule: ErrorSchedule,
    parallelism: u32,
) -> Result<()> {
    let circuit = new_circuit(name, config)?;
    let listeners: Vec<Arc<dyn StateChangeListener>> = vec![Arc::new(MyStateListener {})];
    circuit.register_state_change_listeners(listeners);
    let harness = Harness::with_limiter(circuit, ConcurrencyLimiter::new(parallelism)?);
    let workload = Arc::new(SimulatedWorkload::new(schedule));

    let report = harness
        .run(
            300,
            |index| {
                let workload = Arc::clone(&workload);
                async move {
                    // keep the requests from finishing within the same millisecond
                    tokio::time::sleep(std::time::Duration::from_micros(200)).await;
                    workload.primary(index)
                }
            },
            |_, err| {
                if err.is_circuit_open() {
                    println!("In backup: {}", err);
                }
                Ok(())
            },
        )
        .await?;

    println!("{}: {}ms", name, report.elapsed.as_millis());
    println!("totalMain {}", report.snapshot.primary_success_count);
    println!(
        "totalBackup {}",
        report.snapshot.fallback_error_count + report.snapshot.fallback_open_count
    );
    println!("totalOpenCircuit {}", report.snapshot.fallback_open_count);
    println!("final state {}", report.final_state);
    Ok(())
}

/// replays 300 requests with random failures against two circuit settings
#[tokio::main]
async fn main() -> Result<()> {
    sentinel_circuit::init_default()
        .unwrap_or_else(|err| sentinel_circuit::logging::error!("{:?}", err));

    // only an all-failing window of 50 requests opens it, 20 requests in flight
    replay(
        "tolerant",
        CircuitConfig {
            request_volume_threshold: 50,
            error_threshold_percentage: 100,
            sleep_window_ms: 100,
            timeout_ms: 1000,
            max_concurrent_requests: 1,
            rolling_window_ms: 0,
        },
        ErrorSchedule::Flat(25),
        20,
    )
    .await?;

    // a 75% failure burst over requests 51..=150, executed one by one
    replay(
        "burst",
        CircuitConfig {
            request_volume_threshold: 20,
            error_threshold_percentage: 50,
            sleep_window_ms: 3,
            timeout_ms: 1000,
            max_concurrent_requests: 1,
            rolling_window_ms: 0,
        },
        ErrorSchedule::Burst {
            base: 25,
            burst: 75,
            range: 51..=150,
        },
        1,
    )
    .await
}
