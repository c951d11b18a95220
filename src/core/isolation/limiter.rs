use crate::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// `ConcurrencyLimiter` bounds how many commands run at the same time.
/// Clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    max: u32,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicU32>,
    peak: Arc<AtomicU32>,
}

impl ConcurrencyLimiter {
    pub fn new(max: u32) -> Result<Self> {
        if max == 0 {
            return Err(Error::msg("concurrency limit must be positive"));
        }
        Ok(ConcurrencyLimiter {
            max,
            semaphore: Arc::new(Semaphore::new(max as usize)),
            in_flight: Arc::new(AtomicU32::new(0)),
            peak: Arc::new(AtomicU32::new(0)),
        })
    }

    /// `acquire` suspends until a slot is free.
    pub async fn acquire(&self) -> Result<Slot> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| Error::msg(format!("Semaphore error: {}", e)))?;
        Ok(self.hold(permit))
    }

    pub fn try_acquire(&self) -> Option<Slot> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.hold(permit))
    }

    /// `wait_all_released` returns once every slot handed out before the call is released.
    /// It briefly holds all slots, so callers acquiring meanwhile wait behind it.
    pub async fn wait_all_released(&self) -> Result<()> {
        let _all = self
            .semaphore
            .acquire_many(self.max)
            .await
            .map_err(|e| Error::msg(format!("Semaphore error: {}", e)))?;
        Ok(())
    }

    #[inline]
    pub fn current_concurrency(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// `peak_concurrency` is the highest number of slots held at once since creation.
    #[inline]
    pub fn peak_concurrency(&self) -> u32 {
        self.peak.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn max_concurrency(&self) -> u32 {
        self.max
    }

    fn hold(&self, permit: OwnedSemaphorePermit) -> Slot {
        let held = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(held, Ordering::SeqCst);
        Slot {
            in_flight: Arc::clone(&self.in_flight),
            _permit: permit,
        }
    }
}

/// `Slot` is one unit of the limiter, returned on `release()` or drop.
#[derive(Debug)]
pub struct Slot {
    in_flight: Arc<AtomicU32>,
    _permit: OwnedSemaphorePermit,
}

impl Slot {
    #[inline]
    pub fn release(self) {}
}

impl Drop for Slot {
    fn drop(&mut self) {
        // the permit field is dropped after this, so the count never lags behind the semaphore
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn zero_limit() {
        assert!(ConcurrencyLimiter::new(0).is_err());
    }

    #[test]
    fn try_acquire_exhausts() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        let a = limiter.try_acquire().unwrap();
        let b = limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.current_concurrency(), 2);
        a.release();
        assert_eq!(limiter.current_concurrency(), 1);
        let c = limiter.try_acquire().unwrap();
        drop(b);
        drop(c);
        assert_eq!(limiter.current_concurrency(), 0);
        assert_eq!(limiter.peak_concurrency(), 2);
        assert_eq!(limiter.max_concurrency(), 2);
    }

    #[tokio::test]
    async fn never_exceeds_limit() {
        let limiter = ConcurrencyLimiter::new(3).unwrap();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let slot = limiter.acquire().await.unwrap();
                assert!(limiter.current_concurrency() <= 3);
                tokio::time::sleep(Duration::from_millis(1)).await;
                slot.release();
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }
        assert!(limiter.peak_concurrency() <= 3);
        assert_eq!(limiter.current_concurrency(), 0);
    }

    #[tokio::test]
    async fn wait_all_released() {
        let limiter = ConcurrencyLimiter::new(2).unwrap();
        let slot = limiter.acquire().await.unwrap();
        let holder = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            slot.release();
        });
        limiter.wait_all_released().await.unwrap();
        assert_eq!(limiter.current_concurrency(), 0);
        holder.await.unwrap();
        // slots are usable again afterwards
        assert!(limiter.try_acquire().is_some());
    }
}
