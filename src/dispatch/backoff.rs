//! Retry backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff between retries against the same endpoint.
///
/// Delay for attempt `n` is `base * 2^n` capped at `max`, with ±30% jitter
/// so synchronized clients don't retry in lockstep against a recovering
/// backend.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            max: Duration::from_millis(max_ms.max(base_ms)),
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max);

        let jitter = rand::thread_rng().gen_range(0.7..=1.3);
        exp.mul_f64(jitter).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_within_jitter_bounds() {
        let backoff = Backoff::new(100, 10_000);
        for attempt in 0..4 {
            let expected = Duration::from_millis(100 * 2u64.pow(attempt));
            let delay = backoff.delay(attempt);
            assert!(delay >= expected.mul_f64(0.7), "attempt {attempt}: {delay:?}");
            assert!(delay <= expected.mul_f64(1.3), "attempt {attempt}: {delay:?}");
        }
    }

    #[test]
    fn delay_is_capped_at_max() {
        let backoff = Backoff::new(100, 500);
        for attempt in 0..20 {
            assert!(backoff.delay(attempt) <= Duration::from_millis(500));
        }
    }

    #[test]
    fn large_attempt_counts_do_not_overflow() {
        let backoff = Backoff::new(100, 2000);
        assert!(backoff.delay(u32::MAX) <= Duration::from_millis(2000));
    }
}
