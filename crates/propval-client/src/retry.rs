//! Fixed-delay retry budget

use std::time::Duration;

/// Bounded fixed-delay retry policy. Only `Unavailable` failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Starts a fresh budget for one logical operation.
    pub fn context(&self) -> RetryContext {
        RetryContext::new(*self)
    }
}

/// Retry budget of one logical operation. Never shared between invocations.
#[derive(Debug, Clone)]
pub struct RetryContext {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryContext {
    /// Creates a context with no retries consumed.
    pub fn new(policy: RetryPolicy) -> Self {
        tracing::trace!(
            "Initializing retry context: max_retries={}, delay={}ms",
            policy.max_retries,
            policy.retry_delay.as_millis()
        );

        Self { policy, attempt: 0 }
    }

    /// Retries consumed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Configured retry budget.
    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    /// Delay to wait before the next attempt.
    pub fn delay(&self) -> Duration {
        self.policy.retry_delay
    }

    /// True once no retries remain.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.policy.max_retries
    }

    /// Consumes one retry. Returns false, leaving the budget untouched, if none remain.
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            tracing::debug!("Retry budget of {} exhausted", self.policy.max_retries);
            return false;
        }
        self.attempt += 1;
        true
    }
}
