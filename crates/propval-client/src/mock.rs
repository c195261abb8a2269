//! Scriptable in-process transport for tests
//!
//! Probe calls (see [`ValuationRequest::probe`]) and business calls are scripted and counted
//! separately so tests can reason about how many real valuation calls went out.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::transport::ValuationTransport;
use crate::types::{ValuationRequest, ValuationResult};

/// Backend behaviour applied to business calls that have no scripted outcome.
pub type BackendRule = Box<dyn Fn(&ValuationRequest) -> Result<ValuationResult> + Send + Sync>;

/// Channel handed out by [`MockTransport::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockChannel {
    /// Sequence number of the `open` call that produced this channel
    pub id: usize,
    /// Address the channel was opened for
    pub address: String,
}

/// In-process stand-in for the valuation service.
pub struct MockTransport {
    response: ValuationResult,
    latency: Option<Duration>,
    always_fail: Option<TransportError>,
    rule: Option<BackendRule>,
    business_script: Mutex<VecDeque<TransportError>>,
    probe_script: Mutex<VecDeque<TransportError>>,
    opens: AtomicUsize,
    probe_calls: AtomicUsize,
    business_calls: AtomicUsize,
    requests: Mutex<Vec<ValuationRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Healthy backend answering every call with the canned mock result.
    pub fn new() -> Self {
        Self {
            response: ValuationResult::new(500000.0, 0.85, "Mock valuation result"),
            latency: None,
            always_fail: None,
            rule: None,
            business_script: Mutex::new(VecDeque::new()),
            probe_script: Mutex::new(VecDeque::new()),
            opens: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            business_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend that refuses every call, probes included.
    pub fn unreachable() -> Self {
        Self::new().failing_with(TransportError::unavailable("connection refused"))
    }

    /// Every call, probes included, fails with `err`.
    pub fn failing_with(mut self, err: TransportError) -> Self {
        self.always_fail = Some(err);
        self
    }

    /// Result returned by successful business calls.
    pub fn with_response(mut self, response: ValuationResult) -> Self {
        self.response = response;
        self
    }

    /// Delay before every answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Rule deciding the outcome of unscripted business calls.
    pub fn with_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&ValuationRequest) -> Result<ValuationResult> + Send + Sync + 'static,
    {
        self.rule = Some(Box::new(rule));
        self
    }

    /// The next `times` business calls fail with `err`.
    pub fn fail_calls(self, times: usize, err: TransportError) -> Self {
        push_n(&self.business_script, times, err);
        self
    }

    /// The next `times` probe calls fail with `err`.
    pub fn fail_probes(self, times: usize, err: TransportError) -> Self {
        push_n(&self.probe_script, times, err);
        self
    }

    /// Number of channels opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of probe calls received.
    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Number of business (non-probe) calls received.
    pub fn call_count(&self) -> usize {
        self.business_calls.load(Ordering::SeqCst)
    }

    /// Every business request received, in arrival order.
    pub fn requests(&self) -> Vec<ValuationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_scripted(script: &Mutex<VecDeque<TransportError>>) -> Option<TransportError> {
        script.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }
}

fn push_n(script: &Mutex<VecDeque<TransportError>>, times: usize, err: TransportError) {
    let mut script = script.lock().unwrap_or_else(|e| e.into_inner());
    script.extend(std::iter::repeat(err).take(times));
}

#[async_trait]
impl ValuationTransport for MockTransport {
    type Channel = MockChannel;

    fn open(&self, address: &str) -> Result<MockChannel> {
        let id = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockChannel {
            id,
            address: address.to_string(),
        })
    }

    async fn call(
        &self,
        _channel: &MockChannel,
        request: &ValuationRequest,
        _deadline: Duration,
    ) -> Result<ValuationResult> {
        let probe = request.is_probe();
        if probe {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
        } else {
            self.business_calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request.clone());
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = &self.always_fail {
            return Err(err.clone());
        }

        if probe {
            return match Self::next_scripted(&self.probe_script) {
                Some(err) => Err(err),
                None => Ok(self.response.clone()),
            };
        }

        if let Some(err) = Self::next_scripted(&self.business_script) {
            return Err(err);
        }
        match &self.rule {
            Some(rule) => rule(request),
            None => Ok(self.response.clone()),
        }
    }
}
