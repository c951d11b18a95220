use crate::{Error, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};

/// `ErrorSchedule` is the failure probability, in percent, of each request index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSchedule {
    Flat(u32),
    /// `burst` applies to the indexes in `range`, `base` to all others.
    Burst {
        base: u32,
        burst: u32,
        range: RangeInclusive<usize>,
    },
}

impl ErrorSchedule {
    pub fn percentage_for(&self, index: usize) -> u32 {
        let pct = match self {
            ErrorSchedule::Flat(pct) => *pct,
            ErrorSchedule::Burst { base, burst, range } => {
                if range.contains(&index) {
                    *burst
                } else {
                    *base
                }
            }
        };
        pct.min(100)
    }
}

/// `SimulatedWorkload` fails requests at random following its schedule.
#[derive(Debug)]
pub struct SimulatedWorkload {
    schedule: ErrorSchedule,
    rng: Mutex<StdRng>,
}

impl SimulatedWorkload {
    pub fn new(schedule: ErrorSchedule) -> Self {
        SimulatedWorkload {
            schedule,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A seeded workload replays the same failure sequence when indexes are drawn in the same order.
    pub fn with_seed(schedule: ErrorSchedule, seed: u64) -> Self {
        SimulatedWorkload {
            schedule,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    #[inline]
    pub fn schedule(&self) -> &ErrorSchedule {
        &self.schedule
    }

    pub fn should_fail(&self, index: usize) -> bool {
        let pct = self.schedule.percentage_for(index);
        let draw: u32 = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..100);
        draw < pct
    }

    /// `primary` is a primary operation body failing per the schedule.
    pub fn primary(&self, index: usize) -> Result<()> {
        if self.should_fail(index) {
            Err(Error::msg(format!("simulated failure of request {}", index)))
        } else {
            Ok(())
        }
    }
}
