//! Drives a batch of requests through one circuit under the concurrency limiter,
//! and tallies how each of them ended.

pub mod workload;

pub use workload::*;

use crate::{
    aggregator::{OutcomeAggregator, OutcomeSnapshot},
    base::CommandError,
    circuitbreaker::{Circuit, State},
    command::Command,
    isolation::ConcurrencyLimiter,
    logging, Error, Result,
};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub snapshot: OutcomeSnapshot,
    pub elapsed: Duration,
    pub final_state: State,
    /// requests whose fallback failed as well, they are still counted in `snapshot`
    pub fallback_failures: u64,
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, fallback failures: {}, final state: {}, elapsed: {}ms",
            self.snapshot,
            self.fallback_failures,
            self.final_state,
            self.elapsed.as_millis()
        )
    }
}

#[derive(Debug, Clone)]
pub struct Harness {
    command: Command,
    limiter: ConcurrencyLimiter,
}

impl Harness {
    /// `new` sizes the limiter from the circuit's `max_concurrent_requests`.
    pub fn new(circuit: Arc<Circuit>) -> Result<Self> {
        let limiter = ConcurrencyLimiter::new(circuit.config().max_concurrent_requests)?;
        Ok(Self::with_limiter(circuit, limiter))
    }

    pub fn with_limiter(circuit: Arc<Circuit>, limiter: ConcurrencyLimiter) -> Self {
        Harness {
            command: Command::new(circuit),
            limiter,
        }
    }

    #[inline]
    pub fn circuit(&self) -> &Arc<Circuit> {
        self.command.circuit()
    }

    #[inline]
    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// `run` issues `request_count` commands, indexed from 0, one task each.
    /// A task is spawned only once it holds a limiter slot, and the report is built
    /// after every slot is back and every task is joined.
    pub async fn run<T, P, Fut, F>(
        &self,
        request_count: usize,
        primary_for: P,
        fallback_for: F,
    ) -> Result<HarnessReport>
    where
        T: Send + 'static,
        P: Fn(usize) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        F: Fn(usize, CommandError) -> Result<T> + Send + Sync + 'static,
    {
        let start = Instant::now();
        let aggregator = Arc::new(OutcomeAggregator::new());
        let fallback_for = Arc::new(fallback_for);
        let mut tasks = JoinSet::new();

        for index in 0..request_count {
            let slot = self.limiter.acquire().await?;
            let command = self.command.clone();
            let aggregator = Arc::clone(&aggregator);
            let fallback_for = Arc::clone(&fallback_for);
            let primary = primary_for(index);
            tasks.spawn(async move {
                let execution = command
                    .run(move || primary, move |err| (*fallback_for)(index, err))
                    .await;
                aggregator.record(&execution.outcome);
                slot.release();
                execution.result.is_ok()
            });
        }

        self.limiter.wait_all_released().await?;
        let mut fallback_failures = 0;
        while let Some(res) = tasks.join_next().await {
            let ok = res.map_err(|e| Error::msg(format!("harness task failed: {}", e)))?;
            if !ok {
                fallback_failures += 1;
            }
        }

        let report = HarnessReport {
            snapshot: aggregator.snapshot(),
            elapsed: start.elapsed(),
            final_state: self.circuit().state(),
            fallback_failures,
        };
        logging::info!("[Harness] {} finished: {}", self.circuit().name(), report);
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuitbreaker::CircuitConfig;

    #[tokio::test]
    async fn counts_every_request() {
        let circuit = Arc::new(Circuit::new("harness", CircuitConfig::default()).unwrap());
        let harness = Harness::new(circuit).unwrap();
        let report = harness
            .run(
                50,
                |index| async move {
                    if index % 5 == 0 {
                        Err(Error::msg("boom"))
                    } else {
                        Ok(index)
                    }
                },
                |index, _| Ok(index),
            )
            .await
            .unwrap();
        assert_eq!(report.snapshot.total(), 50);
        assert_eq!(report.snapshot.primary_success_count, 40);
        assert_eq!(report.snapshot.fallback_error_count, 10);
        assert_eq!(report.fallback_failures, 0);
        assert_eq!(report.final_state, State::Closed);
        assert!(harness.limiter().peak_concurrency() <= 10);
        assert_eq!(harness.limiter().current_concurrency(), 0);
    }

    #[tokio::test]
    async fn fallback_failures_are_counted() {
        let circuit = Arc::new(Circuit::new("harness", CircuitConfig::default()).unwrap());
        let harness = Harness::new(circuit).unwrap();
        let report = harness
            .run(
                10,
                |_| async { Err::<(), _>(Error::msg("boom")) },
                |index, _| {
                    if index % 2 == 0 {
                        Err(Error::msg("no cache"))
                    } else {
                        Ok(())
                    }
                },
            )
            .await
            .unwrap();
        assert_eq!(report.snapshot.fallback_error_count, 10);
        assert_eq!(report.fallback_failures, 5);
    }
}
