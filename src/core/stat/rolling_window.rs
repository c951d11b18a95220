use super::MetricTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// `RollingWindow` counts the attempts, successes and failures since the window start.
/// It is a plain reset-on-demand counter, not a bucketed sliding window:
/// the circuit breaker decides when the recent history becomes stale.
#[derive(Debug, Default)]
pub struct RollingWindow {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    start_ms: AtomicU64,
}

/// A point-in-time copy of a `RollingWindow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub error_percentage: u32,
    pub start_ms: u64,
}

impl fmt::Display for WindowSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempts: {}, successes: {}, failures: {}, error: {}%",
            self.attempts, self.successes, self.failures, self.error_percentage
        )
    }
}

#[inline]
fn percentage(failures: u64, attempts: u64) -> u32 {
    if attempts == 0 {
        return 0;
    }
    (failures.saturating_mul(100) / attempts).min(100) as u32
}

impl RollingWindow {
    pub fn new(start_ms: u64) -> Self {
        RollingWindow {
            start_ms: AtomicU64::new(start_ms),
            ..Default::default()
        }
    }

    #[inline]
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn start_ms(&self) -> u64 {
        self.start_ms.load(Ordering::SeqCst)
    }

    /// `error_percentage` is `failures * 100 / attempts` in `[0, 100]`, and 0 without attempts.
    pub fn error_percentage(&self) -> u32 {
        percentage(self.failures(), self.total_attempts())
    }

    /// `is_expired` reports whether `period_ms` has elapsed since the window start.
    /// A zero period never expires.
    pub fn is_expired(&self, now_ms: u64, period_ms: u64) -> bool {
        period_ms > 0 && now_ms.saturating_sub(self.start_ms()) >= period_ms
    }

    /// `reset_at` clears all the counters and restarts the window at `now_ms`.
    pub fn reset_at(&self, now_ms: u64) {
        self.reset();
        self.start_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let attempts = self.total_attempts();
        let successes = self.successes();
        let failures = self.failures();
        WindowSnapshot {
            attempts,
            successes,
            failures,
            error_percentage: percentage(failures, attempts),
            start_ms: self.start_ms(),
        }
    }
}

impl MetricTrait for RollingWindow {
    fn reset(&self) {
        self.attempts.store(0, Ordering::SeqCst);
        self.successes.store(0, Ordering::SeqCst);
        self.failures.store(0, Ordering::SeqCst);
    }
}
