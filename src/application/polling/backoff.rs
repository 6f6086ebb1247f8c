//! Two-level poll interval control.

use std::time::Duration;

/// Derives the next poll interval from consecutive failed cycles.
///
/// This is hysteresis, not exponential backoff: the interval is either
/// `base` or `degraded`. It switches to `degraded` once `threshold`
/// consecutive cycles failed and drops straight back to `base` after a
/// single full pass.
#[derive(Debug, Clone)]
pub struct BackoffController {
    base: Duration,
    degraded: Duration,
    threshold: u32,
    consecutive_failures: u32,
}

impl BackoffController {
    #[must_use]
    pub fn new(base: Duration, degraded: Duration, threshold: u32) -> Self {
        Self {
            base,
            degraded,
            threshold,
            consecutive_failures: 0,
        }
    }

    /// Record the outcome of a cycle and return the interval to wait next.
    pub fn record(&mut self, full_pass: bool) -> Duration {
        if full_pass {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        self.interval()
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        if self.is_degraded() {
            self.degraded
        } else {
            self.base
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(2);
    const DEGRADED: Duration = Duration::from_secs(30);

    fn controller() -> BackoffController {
        BackoffController::new(BASE, DEGRADED, 3)
    }

    #[test]
    fn starts_at_base_interval() {
        let backoff = controller();
        assert_eq!(backoff.interval(), BASE);
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn stays_at_base_below_threshold() {
        let mut backoff = controller();
        assert_eq!(backoff.record(false), BASE);
        assert_eq!(backoff.record(false), BASE);
        assert_eq!(backoff.consecutive_failures(), 2);
    }

    #[test]
    fn switches_to_degraded_at_threshold() {
        let mut backoff = controller();
        backoff.record(false);
        backoff.record(false);
        assert_eq!(backoff.record(false), DEGRADED);
        assert!(backoff.is_degraded());

        // Further failures stay degraded, never beyond.
        for _ in 0..20 {
            assert_eq!(backoff.record(false), DEGRADED);
        }
    }

    #[test]
    fn single_full_pass_resets_immediately() {
        let mut backoff = controller();
        for _ in 0..5 {
            backoff.record(false);
        }
        assert_eq!(backoff.interval(), DEGRADED);

        assert_eq!(backoff.record(true), BASE);
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn interleaved_success_prevents_degradation() {
        let mut backoff = controller();
        for _ in 0..10 {
            backoff.record(false);
            backoff.record(false);
            assert_eq!(backoff.record(true), BASE);
        }
    }

    #[test]
    fn interval_is_always_one_of_two_levels() {
        let mut backoff = controller();
        let pattern = [false, false, true, false, false, false, false, true, false];
        for full_pass in pattern {
            let interval = backoff.record(full_pass);
            assert!(interval == BASE || interval == DEGRADED);
        }
    }
}
