use crate::{
    base::{CommandError, Execution, Outcome},
    circuitbreaker::Circuit,
    logging, Error, Result,
};
use std::future::Future;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

/// `Command` runs a primary operation guarded by a circuit,
/// and degrades to a fallback when the circuit rejects it or it fails.
#[derive(Debug, Clone)]
pub struct Command {
    circuit: Arc<Circuit>,
}

impl Command {
    pub fn new(circuit: Arc<Circuit>) -> Self {
        Command { circuit }
    }

    #[inline]
    pub fn circuit(&self) -> &Arc<Circuit> {
        &self.circuit
    }

    /// `execute` returns the primary's value, or whatever the fallback returns.
    /// A failing fallback surfaces as `CommandError::Fallback` inside the returned error.
    pub async fn execute<T, P, Fut, F>(&self, primary: P, fallback: F) -> Result<T>
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        F: FnOnce(CommandError) -> Result<T>,
    {
        self.run(primary, fallback).await.into_result()
    }

    /// `run` is `execute` that also reports how the call ended.
    pub async fn run<T, P, Fut, F>(&self, primary: P, fallback: F) -> Execution<T>
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        F: FnOnce(CommandError) -> Result<T>,
    {
        match self.try_primary(primary).await {
            Ok(value) => Execution {
                outcome: Outcome::PrimarySuccess,
                result: Ok(value),
            },
            Err(cause) => self.fall_back(cause, fallback),
        }
    }

    async fn try_primary<T, P, Fut>(&self, primary: P) -> std::result::Result<T, CommandError>
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let admission = self.circuit.try_admit()?;
        let config = self.circuit.config();
        // on expiry the primary future is dropped, we stop waiting for it
        match tokio::time::timeout(config.timeout(), primary()).await {
            Ok(Ok(value)) => {
                admission.succeed();
                Ok(value)
            }
            Ok(Err(err)) => {
                admission.fail();
                Err(CommandError::Operation(err))
            }
            Err(_) => {
                admission.fail();
                Err(CommandError::timeout(self.circuit.name(), config.timeout_ms))
            }
        }
    }

    pub fn execute_blocking<T, P, F>(&self, primary: P, fallback: F) -> Result<T>
    where
        T: Send + 'static,
        P: FnOnce() -> Result<T> + Send + 'static,
        F: FnOnce(CommandError) -> Result<T>,
    {
        self.run_blocking(primary, fallback).into_result()
    }

    /// `run_blocking` runs the primary on its own thread and waits at most the circuit timeout.
    /// A thread that outlives the timeout is abandoned, not interrupted.
    pub fn run_blocking<T, P, F>(&self, primary: P, fallback: F) -> Execution<T>
    where
        T: Send + 'static,
        P: FnOnce() -> Result<T> + Send + 'static,
        F: FnOnce(CommandError) -> Result<T>,
    {
        match self.try_primary_blocking(primary) {
            Ok(value) => Execution {
                outcome: Outcome::PrimarySuccess,
                result: Ok(value),
            },
            Err(cause) => self.fall_back(cause, fallback),
        }
    }

    fn try_primary_blocking<T, P>(&self, primary: P) -> std::result::Result<T, CommandError>
    where
        T: Send + 'static,
        P: FnOnce() -> Result<T> + Send + 'static,
    {
        let admission = self.circuit.try_admit()?;
        let config = self.circuit.config();
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("command-{}", self.circuit.name()))
            .spawn(move || {
                // the receiver is gone once the caller timed out
                let _ = tx.send(primary());
            });
        if let Err(err) = spawned {
            admission.fail();
            return Err(CommandError::Operation(Error::new(err)));
        }
        match rx.recv_timeout(config.timeout()) {
            Ok(Ok(value)) => {
                admission.succeed();
                Ok(value)
            }
            Ok(Err(err)) => {
                admission.fail();
                Err(CommandError::Operation(err))
            }
            Err(RecvTimeoutError::Timeout) => {
                admission.fail();
                Err(CommandError::timeout(self.circuit.name(), config.timeout_ms))
            }
            Err(RecvTimeoutError::Disconnected) => {
                admission.fail();
                Err(CommandError::Operation(Error::msg(
                    "primary operation panicked",
                )))
            }
        }
    }

    fn fall_back<T, F>(&self, cause: CommandError, fallback: F) -> Execution<T>
    where
        F: FnOnce(CommandError) -> Result<T>,
    {
        let outcome = Outcome::from_error(&cause);
        logging::debug!(
            "[Command] {} falls back, cause: {}",
            self.circuit.name(),
            cause
        );
        let detached = cause.detached();
        let result = fallback(cause).map_err(|err| {
            logging::warn!(
                "[Command] fallback of {} failed: {}, cause: {}",
                self.circuit.name(),
                err,
                detached
            );
            Error::new(detached.with_fallback_error(err))
        });
        Execution { outcome, result }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuitbreaker::{CircuitConfig, State};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn command(config: CircuitConfig) -> Command {
        Command::new(Arc::new(Circuit::new("test", config).unwrap()))
    }

    fn short_timeout() -> CircuitConfig {
        CircuitConfig {
            timeout_ms: 20,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn success_skips_fallback() {
        let command = command(CircuitConfig::default());
        let called = AtomicBool::new(false);
        let execution = command
            .run(
                || async { Ok(42) },
                |_| {
                    called.store(true, Ordering::SeqCst);
                    Ok(0)
                },
            )
            .await;
        assert_eq!(execution.outcome, Outcome::PrimarySuccess);
        assert_eq!(execution.into_result().unwrap(), 42);
        assert!(!called.load(Ordering::SeqCst));
        let snapshot = command.circuit().window_snapshot();
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.successes, 1);
    }

    #[tokio::test]
    async fn operation_failure_falls_back() {
        let command = command(CircuitConfig::default());
        let execution = command
            .run(
                || async { Err::<i32, _>(Error::msg("boom")) },
                |err| {
                    assert!(matches!(err, CommandError::Operation(_)));
                    Ok(-1)
                },
            )
            .await;
        assert_eq!(
            execution.outcome,
            Outcome::FallbackAfterError {
                cause: "operation failed: boom".into()
            }
        );
        assert_eq!(execution.into_result().unwrap(), -1);
        assert_eq!(command.circuit().window_snapshot().failures, 1);
    }

    #[tokio::test]
    async fn timeout_falls_back() {
        let command = command(short_timeout());
        let execution = command
            .run(
                || async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok("late")
                },
                |err| {
                    assert!(err.is_timeout());
                    Ok("fallback")
                },
            )
            .await;
        assert_eq!(
            execution.outcome,
            Outcome::FallbackAfterError {
                cause: "circuit test timed out after 20ms".into()
            }
        );
        assert_eq!(execution.into_result().unwrap(), "fallback");
        assert_eq!(command.circuit().window_snapshot().failures, 1);
    }

    #[tokio::test]
    async fn open_circuit_skips_primary() {
        let command = command(CircuitConfig {
            request_volume_threshold: 1,
            ..Default::default()
        });
        let result = command
            .execute(|| async { Err::<(), _>(Error::msg("boom")) }, |_| Ok(()))
            .await;
        assert!(result.is_ok());
        assert_eq!(command.circuit().state(), State::Open);

        let called = AtomicBool::new(false);
        let execution = command
            .run(
                || async {
                    called.store(true, Ordering::SeqCst);
                    Ok(1)
                },
                |err| {
                    assert!(err.is_circuit_open());
                    Ok(2)
                },
            )
            .await;
        assert_eq!(execution.outcome, Outcome::FallbackAfterOpen);
        assert_eq!(execution.into_result().unwrap(), 2);
        assert!(!called.load(Ordering::SeqCst));
        // rejections are not counted
        assert_eq!(command.circuit().window_snapshot().attempts, 1);
    }

    #[tokio::test]
    async fn fallback_failure_propagates() {
        let command = command(CircuitConfig::default());
        let err = command
            .execute(
                || async { Err::<(), _>(Error::msg("boom")) },
                |_| Err(Error::msg("no cache")),
            )
            .await
            .unwrap_err();
        let err = err.downcast_ref::<CommandError>().unwrap();
        assert!(err.is_fallback());
        assert!(matches!(err.root_cause(), CommandError::Operation(_)));
        assert_eq!(
            err.to_string(),
            "fallback failed: no cache, cause: operation failed: boom"
        );
    }

    #[test]
    fn blocking_success_and_failure() {
        let command = command(CircuitConfig::default());
        assert_eq!(
            command
                .execute_blocking(|| Ok(7), |_| Ok(0))
                .unwrap(),
            7
        );
        let execution = command.run_blocking(|| Err::<i32, _>(Error::msg("boom")), |_| Ok(0));
        assert!(matches!(
            execution.outcome,
            Outcome::FallbackAfterError { .. }
        ));
        let snapshot = command.circuit().window_snapshot();
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures, 1);
    }

    #[test]
    fn blocking_timeout() {
        let command = command(short_timeout());
        let execution = command.run_blocking(
            || {
                thread::sleep(Duration::from_millis(300));
                Ok(1)
            },
            |err| {
                assert!(err.is_timeout());
                Ok(2)
            },
        );
        assert_eq!(execution.into_result().unwrap(), 2);
    }

    #[test]
    fn blocking_panic_is_failure() {
        let command = command(CircuitConfig::default());
        let execution = command.run_blocking(
            || -> Result<i32> { panic!("primary blew up") },
            |err| {
                assert!(matches!(err, CommandError::Operation(_)));
                Ok(0)
            },
        );
        assert_eq!(
            execution.outcome,
            Outcome::FallbackAfterError {
                cause: "operation failed: primary operation panicked".into()
            }
        );
        assert_eq!(command.circuit().window_snapshot().failures, 1);
    }
}
