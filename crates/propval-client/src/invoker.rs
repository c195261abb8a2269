//! Retry-aware invoker
//!
//! Runs one logical valuation with a per-invocation
//! [`RetryContext`](crate::retry::RetryContext): connect (probing if needed), call, and on
//! `Unavailable` drop the connection, sleep the fixed delay and go round again until the
//! budget runs out. Every other failure is returned at once.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::transport::{call_with_deadline, GrpcTransport, ValuationTransport};
use crate::types::{ValuationRequest, ValuationResult};

/// What the gateways need from the valuation client. Object safe, so the composition root
/// can hand one `Arc<dyn ValuationService>` to every adapter.
#[async_trait]
pub trait ValuationService: Send + Sync {
    /// Runs one valuation with connection-aware retry.
    async fn calculate_valuation(&self, request: ValuationRequest) -> Result<ValuationResult>;

    /// Makes sure a believed-live connection exists, probing if necessary. Never retries.
    async fn check_connection(&self) -> Result<()>;

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;
}

/// Shared client: one connection, many concurrent invocations.
pub struct ValuationInvoker<T: ValuationTransport> {
    connection: ConnectionManager<T>,
    call_timeout: Duration,
    retry: RetryPolicy,
}

impl ValuationInvoker<GrpcTransport> {
    /// Invoker over the tonic binding. The channel is opened lazily on first use.
    pub fn grpc(config: ClientConfig) -> Self {
        let transport = Arc::new(GrpcTransport::new(config.call_timeout));
        Self::new(transport, config)
    }
}

impl<T: ValuationTransport> ValuationInvoker<T> {
    /// Creates an invoker over `transport`.
    pub fn new(transport: Arc<T>, config: ClientConfig) -> Self {
        Self {
            connection: ConnectionManager::new(transport, config.address, config.call_timeout),
            call_timeout: config.call_timeout,
            retry: config.retry,
        }
    }

    /// The underlying connection state machine.
    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    /// Retry policy applied to each invocation.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Runs `request` against the service.
    pub async fn invoke(&self, request: &ValuationRequest) -> Result<ValuationResult> {
        let mut retry = self.retry.context();

        loop {
            let outcome = match self.connection.ensure_connected().await {
                Ok(channel) => {
                    let result = call_with_deadline(
                        self.connection.transport(),
                        &channel,
                        request,
                        self.call_timeout,
                    )
                    .await;
                    if matches!(&result, Err(e) if e.is_unavailable()) {
                        self.connection.mark_disconnected();
                    }
                    result
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => {
                    debug!(retries = retry.attempt(), "Valuation call succeeded");
                    return Ok(result);
                }
                Err(e) if e.is_unavailable() && retry.try_consume() => {
                    warn!(
                        "Retrying operation (attempt {}/{}): {}",
                        retry.attempt(),
                        retry.max_retries(),
                        e
                    );
                    tokio::time::sleep(retry.delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<T: ValuationTransport> ValuationService for ValuationInvoker<T> {
    async fn calculate_valuation(&self, request: ValuationRequest) -> Result<ValuationResult> {
        self.invoke(&request).await
    }

    async fn check_connection(&self) -> Result<()> {
        self.connection.ensure_connected().await.map(|_| ())
    }

    fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TransportError};
    use crate::mock::MockTransport;

    const MAX_RETRIES: u32 = 3;

    fn config() -> ClientConfig {
        ClientConfig::new("mock:50051")
            .with_call_timeout(Duration::from_millis(100))
            .with_retry(RetryPolicy::new(MAX_RETRIES, Duration::from_millis(5000)))
    }

    fn invoker(transport: MockTransport) -> (Arc<MockTransport>, ValuationInvoker<MockTransport>) {
        let transport = Arc::new(transport);
        (transport.clone(), ValuationInvoker::new(transport, config()))
    }

    fn request() -> ValuationRequest {
        ValuationRequest {
            address: "123 Test St".to_string(),
            ..ValuationRequest::probe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_success() {
        let (transport, invoker) = invoker(MockTransport::new());

        let result = invoker.invoke(&request()).await.unwrap();

        assert_eq!(result.value, 500000.0);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(invoker.connection().state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_retry_counts() {
        for failures in 0..=5usize {
            let (transport, invoker) = invoker(
                MockTransport::new().fail_calls(failures, TransportError::unavailable("down")),
            );

            let outcome = invoker.invoke(&request()).await;

            let expected_calls = failures.min(MAX_RETRIES as usize) + 1;
            assert_eq!(transport.call_count(), expected_calls, "failures={failures}");
            if failures <= MAX_RETRIES as usize {
                assert!(outcome.is_ok(), "failures={failures}");
            } else {
                assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Unavailable);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_reports_unavailable() {
        let (transport, invoker) = invoker(MockTransport::new().fail_calls(
            MAX_RETRIES as usize + 1,
            TransportError::unavailable("down"),
        ));

        let err = invoker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(transport.call_count(), MAX_RETRIES as usize + 1);
        assert_eq!(invoker.connection().state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_wait_fixed_delay() {
        let (_, invoker) = invoker(
            MockTransport::new().fail_calls(2, TransportError::unavailable("down")),
        );
        let started = tokio::time::Instant::now();

        invoker.invoke(&request()).await.unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(10_000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(15_000), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_argument_is_not_retried() {
        let (transport, invoker) = invoker(
            MockTransport::new()
                .fail_calls(1, TransportError::invalid_argument("Invalid property type")),
        );

        let err = invoker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), Some("Invalid property type"));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(invoker.connection().state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_internal_is_not_retried() {
        let (transport, invoker) =
            invoker(MockTransport::new().fail_calls(1, TransportError::internal("boom")));

        let err = invoker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded_is_not_retried_and_keeps_connection() {
        let transport = Arc::new(MockTransport::new().with_latency(Duration::from_millis(50)));
        let invoker = ValuationInvoker::new(
            transport.clone(),
            config().with_call_timeout(Duration::from_millis(1)),
        );

        let err = invoker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        // The probe also timed out, which still proves the service is reachable.
        assert_eq!(invoker.connection().state(), ConnectionState::Connected);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_service_consumes_budget_on_connect() {
        let (transport, invoker) = invoker(MockTransport::unreachable());

        let err = invoker.invoke(&request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(transport.probe_count(), MAX_RETRIES as usize + 1);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_then_recovery() {
        let (transport, invoker) = invoker(
            MockTransport::new().fail_probes(2, TransportError::unavailable("starting up")),
        );

        assert!(invoker.invoke(&request()).await.is_ok());
        assert_eq!(transport.probe_count(), 3);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_invocation_gets_its_own_budget() {
        let (transport, invoker) = invoker(MockTransport::new().fail_calls(
            MAX_RETRIES as usize,
            TransportError::unavailable("down"),
        ));

        assert!(invoker.invoke(&request()).await.is_ok());
        assert!(invoker.invoke(&request()).await.is_ok());
        assert_eq!(transport.call_count(), MAX_RETRIES as usize + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_trait_object() {
        let (_, invoker) = invoker(MockTransport::new());
        let service: Arc<dyn ValuationService> = Arc::new(invoker);

        assert_eq!(service.connection_state(), ConnectionState::Disconnected);
        service.check_connection().await.unwrap();
        assert_eq!(service.connection_state(), ConnectionState::Connected);
        assert!(service.calculate_valuation(request()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_connection_does_not_retry() {
        let (transport, invoker) = invoker(MockTransport::unreachable());

        let err = invoker.check_connection().await.unwrap_err();

        assert!(err.is_unavailable());
        assert_eq!(transport.probe_count(), 1);
    }
}
