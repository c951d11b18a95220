use super::CommandError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `Outcome` is the terminal classification of one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The primary operation was admitted and succeeded.
    PrimarySuccess,
    /// The primary operation failed or timed out and the fallback was invoked.
    /// `cause` is the rendered originating error.
    FallbackAfterError { cause: String },
    /// The circuit rejected the call and the fallback was invoked.
    FallbackAfterOpen,
}

impl Outcome {
    /// `from_error` classifies the error a fallback is about to be invoked with.
    pub fn from_error(err: &CommandError) -> Self {
        match err.root_cause() {
            CommandError::CircuitOpen { .. } => Outcome::FallbackAfterOpen,
            cause => Outcome::FallbackAfterError {
                cause: cause.to_string(),
            },
        }
    }

    #[inline]
    pub fn is_primary_success(&self) -> bool {
        matches!(self, Outcome::PrimarySuccess)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::PrimarySuccess => write!(f, "PrimarySuccess"),
            Outcome::FallbackAfterError { cause } => write!(f, "FallbackAfterError({})", cause),
            Outcome::FallbackAfterOpen => write!(f, "FallbackAfterOpen"),
        }
    }
}

/// `Execution` carries the caller-facing result together with its outcome.
#[derive(Debug)]
pub struct Execution<T> {
    pub outcome: Outcome,
    pub result: Result<T>,
}

impl<T> Execution<T> {
    #[inline]
    pub fn into_result(self) -> Result<T> {
        self.result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    #[test]
    fn classify_errors() {
        assert_eq!(
            Outcome::from_error(&CommandError::circuit_open("test")),
            Outcome::FallbackAfterOpen
        );
        assert_eq!(
            Outcome::from_error(&CommandError::timeout("test", 5)),
            Outcome::FallbackAfterError {
                cause: "circuit test timed out after 5ms".into()
            }
        );
        assert_eq!(
            Outcome::from_error(&CommandError::Operation(Error::msg("boom"))),
            Outcome::FallbackAfterError {
                cause: "operation failed: boom".into()
            }
        );
    }
}
