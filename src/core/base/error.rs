use crate::Error;
use std::error::Error as StdError;
use std::fmt;

/// `CommandError` classifies why a command did not return the result of its primary operation.
#[derive(Debug)]
pub enum CommandError {
    /// The primary operation failed on its own, the payload is opaque.
    Operation(Error),
    /// The primary operation did not complete within the circuit timeout.
    Timeout { circuit: String, timeout_ms: u64 },
    /// The circuit breaker refused to admit the primary operation.
    CircuitOpen { circuit: String },
    /// The fallback failed as well. `cause` is the error the fallback was invoked with.
    Fallback {
        cause: Box<CommandError>,
        error: Error,
    },
}

impl CommandError {
    pub fn circuit_open<S: Into<String>>(circuit: S) -> Self {
        CommandError::CircuitOpen {
            circuit: circuit.into(),
        }
    }

    pub fn timeout<S: Into<String>>(circuit: S, timeout_ms: u64) -> Self {
        CommandError::Timeout {
            circuit: circuit.into(),
            timeout_ms,
        }
    }

    pub fn with_fallback_error(self, error: Error) -> Self {
        CommandError::Fallback {
            cause: Box::new(self),
            error,
        }
    }

    #[inline]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CommandError::CircuitOpen { .. })
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        matches!(self, CommandError::Fallback { .. })
    }

    /// `detached` copies the error for the fallback failure report, since the fallback
    /// consumes the original. Operation payloads keep only their rendered chain.
    pub(crate) fn detached(&self) -> CommandError {
        match self {
            CommandError::Operation(err) => CommandError::Operation(Error::msg(format!("{:#}", err))),
            CommandError::Timeout {
                circuit,
                timeout_ms,
            } => CommandError::timeout(circuit.as_str(), *timeout_ms),
            CommandError::CircuitOpen { circuit } => CommandError::circuit_open(circuit.as_str()),
            CommandError::Fallback { cause, error } => CommandError::Fallback {
                cause: Box::new(cause.detached()),
                error: Error::msg(format!("{:#}", error)),
            },
        }
    }

    /// `root_cause` unwraps fallback failures down to the error that triggered the first fallback.
    pub fn root_cause(&self) -> &CommandError {
        match self {
            CommandError::Fallback { cause, .. } => cause.root_cause(),
            _ => self,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Operation(err) => write!(f, "operation failed: {}", err),
            CommandError::Timeout {
                circuit,
                timeout_ms,
            } => write!(f, "circuit {} timed out after {}ms", circuit, timeout_ms),
            CommandError::CircuitOpen { circuit } => write!(f, "circuit {} is open", circuit),
            CommandError::Fallback { cause, error } => {
                write!(f, "fallback failed: {}, cause: {}", error, cause)
            }
        }
    }
}

impl StdError for CommandError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CommandError::Operation(err) => Some(&**err),
            CommandError::Fallback { error, .. } => Some(&**error),
            _ => None,
        }
    }
}

impl From<Error> for CommandError {
    fn from(err: Error) -> Self {
        CommandError::Operation(err)
    }
}
