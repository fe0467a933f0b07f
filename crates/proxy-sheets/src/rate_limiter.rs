//! Minimum-interval pacing for outbound image requests
//!
//! One `RateLimiter` is shared (behind an `Arc`) by every fetch worker of a
//! run. Sharing it across runs is a deliberate choice of the caller.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Start of the most recently granted slot
    last_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until at least `min_interval` has passed since the previously
    /// granted slot, across all callers.
    pub async fn wait(&self) {
        let delay = self.reserve_slot();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Claim the next slot and return how long the caller must sleep before
    /// using it. The cursor is advanced under the lock; sleeping happens
    /// outside it.
    fn reserve_slot(&self) -> Duration {
        let mut last_slot = self
            .last_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match *last_slot {
            Some(last) if last + self.min_interval > now => {
                let next = last + self.min_interval;
                *last_slot = Some(next);
                next - now
            }
            _ => {
                *last_slot = Some(now);
                Duration::ZERO
            }
        }
    }
}
