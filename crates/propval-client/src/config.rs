//! Client configuration

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default valuation service address.
pub const DEFAULT_ADDRESS: &str = "localhost:50051";

/// Settings for one shared valuation client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service address (`host:port` or a full URI)
    pub address: String,
    /// Deadline attached to every call, probes included
    pub call_timeout: Duration,
    /// Retry policy for `Unavailable` failures
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            call_timeout: Duration::from_millis(5000),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Config for `address` with default timeout and retry policy.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the per-call deadline.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
