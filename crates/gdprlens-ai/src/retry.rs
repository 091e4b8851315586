//! Retry policy for completion calls.
//!
//! A call moves through `Attempting(n)`. Any HTTP response ends it (success or
//! rejection, neither is retried). A transient failure either schedules
//! `Attempting(n + 1)` after a delay or, once `n` reaches the attempt cap,
//! ends it as exhausted. [`RetryPolicy::next`] is that transition for the
//! transient case, kept free of I/O so the schedule is testable on its own.

use std::time::Duration;

/// A transient failure of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The request hit its timeout.
    TimedOut,
    /// Connection or other request-level failure.
    RequestFailed,
}

/// What to do after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for `delay`, then make attempt number `attempt`.
    RetryAfter { attempt: u32, delay: Duration },
    /// The attempt cap has been reached.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay after a timeout, and the base of the exponential delay.
    pub base_delay: Duration,
    /// Cap on the exponential delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Transition after attempt number `attempt` (1-based) failed with `outcome`.
    ///
    /// Timeouts wait `base_delay`. Request failures wait
    /// `min(base_delay * 2^attempt, max_delay)`, so with the defaults the
    /// first two failures wait 10s and 20s.
    pub fn next(&self, attempt: u32, outcome: AttemptOutcome) -> RetryStep {
        if attempt >= self.max_attempts {
            return RetryStep::Exhausted;
        }
        let delay = match outcome {
            AttemptOutcome::TimedOut => self.base_delay,
            AttemptOutcome::RequestFailed => self.backoff(attempt),
        };
        RetryStep::RetryAfter {
            attempt: attempt + 1,
            delay,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
