//! # Jittered Backoff
//!
//! Uniformly random delays between lock attempts. Competing clients that
//! lose the same race pick different delays, which spreads out their retries.

use rand::Rng;
use std::time::Duration;

/// Uniform random backoff calculator
///
/// Every delay is drawn independently from `[min, max]` with millisecond
/// resolution.
#[derive(Debug, Clone)]
pub struct UniformBackoff {
    min: Duration,
    max: Duration,
}

impl UniformBackoff {
    /// Create a backoff drawing from `[min, max]`; the bounds are swapped if reversed
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max }
    }

    /// Draw the next delay
    pub fn next_delay(&self) -> Duration {
        Self::draw(self.min, self.max)
    }

    /// Draw a single delay from `[min, max]` without tracking state
    #[must_use]
    pub fn draw(min: Duration, max: Duration) -> Duration {
        let lo = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
        let hi = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if lo >= hi {
            return min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}
