use crate::{config::constant::*, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json;
use std::fmt;
use std::time::Duration;

/// `CircuitConfig` encompasses the fields of one circuit. It is fixed once the circuit is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// `request_volume_threshold` is the minimum number of attempts in the current window
    /// before the circuit is eligible to open.
    pub request_volume_threshold: u64,
    /// `error_threshold_percentage` (0-100) opens the circuit once the error percentage
    /// of the window reaches it.
    pub error_threshold_percentage: u32,
    /// `sleep_window_ms` is how long the circuit stays open before a probe is let through.
    pub sleep_window_ms: u64,
    /// `timeout_ms` bounds a single primary call.
    pub timeout_ms: u64,
    /// `max_concurrent_requests` sizes the concurrency limiter that runs the commands.
    /// It is enforced independently of the circuit state.
    pub max_concurrent_requests: u32,
    /// `rolling_window_ms` resets the statistics once it elapses while the circuit is closed.
    /// Zero keeps the statistics until the next state transition.
    pub rolling_window_ms: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        CircuitConfig {
            request_volume_threshold: DEFAULT_REQUEST_VOLUME_THRESHOLD,
            error_threshold_percentage: DEFAULT_ERROR_THRESHOLD_PERCENTAGE,
            sleep_window_ms: DEFAULT_SLEEP_WINDOW_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            rolling_window_ms: DEFAULT_ROLLING_WINDOW_MS,
        }
    }
}

impl CircuitConfig {
    pub fn is_valid(&self) -> Result<()> {
        if self.error_threshold_percentage > 100 {
            return Err(Error::msg(format!(
                "invalid error_threshold_percentage {} (valid range: [0, 100])",
                self.error_threshold_percentage
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::msg("invalid timeout_ms"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(Error::msg("invalid max_concurrent_requests"));
        }
        Ok(())
    }

    #[inline]
    pub fn sleep_window(&self) -> Duration {
        Duration::from_millis(self.sleep_window_ms)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[inline]
    pub fn rolling_window(&self) -> Duration {
        Duration::from_millis(self.rolling_window_ms)
    }
}

impl fmt::Display for CircuitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmtted = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", fmtted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validity() {
        assert!(CircuitConfig::default().is_valid().is_ok());
        let cases = vec![
            CircuitConfig {
                error_threshold_percentage: 101,
                ..Default::default()
            },
            CircuitConfig {
                timeout_ms: 0,
                ..Default::default()
            },
            CircuitConfig {
                max_concurrent_requests: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(config.is_valid().is_err(), "{}", config);
        }
        // zero thresholds and windows are legal
        let config = CircuitConfig {
            request_volume_threshold: 0,
            error_threshold_percentage: 0,
            sleep_window_ms: 0,
            rolling_window_ms: 0,
            ..Default::default()
        };
        assert!(config.is_valid().is_ok());
    }

    #[test]
    fn durations() {
        let config = CircuitConfig {
            sleep_window_ms: 3,
            timeout_ms: 1000,
            ..Default::default()
        };
        assert_eq!(config.sleep_window(), Duration::from_millis(3));
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert_eq!(config.rolling_window(), Duration::from_secs(10));
    }

    #[test]
    fn json_round_trip() {
        let config = CircuitConfig {
            request_volume_threshold: 20,
            error_threshold_percentage: 50,
            sleep_window_ms: 3,
            timeout_ms: 1000,
            max_concurrent_requests: 1,
            rolling_window_ms: 0,
        };
        let parsed: CircuitConfig = serde_json::from_str(&config.to_string()).unwrap();
        assert_eq!(parsed, config);
    }
}
