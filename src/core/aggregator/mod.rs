//! Tallies the terminal outcome of every command execution.

use crate::base::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct OutcomeAggregator {
    primary_success: AtomicU64,
    fallback_error: AtomicU64,
    fallback_open: AtomicU64,
}

impl OutcomeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::PrimarySuccess => &self.primary_success,
            Outcome::FallbackAfterError { .. } => &self.fallback_error,
            Outcome::FallbackAfterOpen => &self.fallback_open,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// `snapshot` reads the three counters. Once every recording task has completed,
    /// repeated snapshots are identical.
    pub fn snapshot(&self) -> OutcomeSnapshot {
        OutcomeSnapshot {
            primary_success_count: self.primary_success.load(Ordering::SeqCst),
            fallback_error_count: self.fallback_error.load(Ordering::SeqCst),
            fallback_open_count: self.fallback_open.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSnapshot {
    pub primary_success_count: u64,
    pub fallback_error_count: u64,
    pub fallback_open_count: u64,
}

impl OutcomeSnapshot {
    #[inline]
    pub fn total(&self) -> u64 {
        self.primary_success_count + self.fallback_error_count + self.fallback_open_count
    }
}

impl fmt::Display for OutcomeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "primary: {}, fallback after error: {}, fallback after open: {}",
            self.primary_success_count, self.fallback_error_count, self.fallback_open_count
        )
    }
}
