//! RPC transport binding
//!
//! A [`ValuationTransport`] knows how to open a channel to an address and issue one unary
//! valuation call over it. Channels are cheap handles that can be cloned and used
//! concurrently. Deadlines are enforced by [`call_with_deadline`] for every binding.

use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::proto;
use crate::proto::valuation_service_client::ValuationServiceClient;
use crate::types::{ValuationRequest, ValuationResult};

/// Binding between the invoker and a concrete RPC framework.
#[async_trait]
pub trait ValuationTransport: Send + Sync + 'static {
    /// Channel handle; must be safe to clone and share between concurrent calls.
    type Channel: Clone + Send + Sync + 'static;

    /// Builds a channel bound to `address`. Must not block on network I/O.
    fn open(&self, address: &str) -> Result<Self::Channel>;

    /// Issues one unary call. `deadline` is a hint the binding may forward to the server;
    /// callers enforce it through [`call_with_deadline`].
    async fn call(
        &self,
        channel: &Self::Channel,
        request: &ValuationRequest,
        deadline: Duration,
    ) -> Result<ValuationResult>;
}

/// Issues a call that fails with `DeadlineExceeded` if no answer arrives within `deadline`.
/// The in-flight call is dropped on expiry; sibling calls are unaffected.
pub async fn call_with_deadline<T: ValuationTransport + ?Sized>(
    transport: &T,
    channel: &T::Channel,
    request: &ValuationRequest,
    deadline: Duration,
) -> Result<ValuationResult> {
    match tokio::time::timeout(deadline, transport.call(channel, request, deadline)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::deadline_exceeded(format!(
            "valuation call exceeded deadline of {}ms",
            deadline.as_millis()
        ))),
    }
}

/// Builds a tonic endpoint for `address`, accepting bare `host:port` as plaintext HTTP/2.
pub fn endpoint_for(address: &str) -> Result<Endpoint> {
    let uri = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };
    Endpoint::from_shared(uri)
        .map_err(|e| TransportError::internal(format!("invalid service address {}: {}", address, e)))
}

/// tonic-backed binding to `valuation.ValuationService`.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    connect_timeout: Duration,
}

impl GrpcTransport {
    /// Creates a binding whose TCP connect attempts give up after `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for GrpcTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

#[async_trait]
impl ValuationTransport for GrpcTransport {
    type Channel = Channel;

    fn open(&self, address: &str) -> Result<Channel> {
        let endpoint = endpoint_for(address)?.connect_timeout(self.connect_timeout);
        debug!(address, "opening lazy gRPC channel");
        Ok(endpoint.connect_lazy())
    }

    async fn call(
        &self,
        channel: &Channel,
        request: &ValuationRequest,
        deadline: Duration,
    ) -> Result<ValuationResult> {
        let mut client = ValuationServiceClient::new(channel.clone());
        let mut req = tonic::Request::new(proto::ValuationRequest::try_from(request)?);
        req.set_timeout(deadline);

        let response = client
            .calculate_valuation(req)
            .await
            .map_err(status_to_error)?;
        ValuationResult::try_from(response.into_inner())
    }
}

/// Maps a status returned by the tonic channel.
///
/// The channel enforces the `grpc-timeout` set on the request itself and reports its expiry
/// as `Cancelled`. Nothing else on the client cancels a call, so `Cancelled` is a missed
/// deadline.
fn status_to_error(status: Status) -> TransportError {
    if status.code() == Code::Cancelled {
        return TransportError::deadline_exceeded(format!(
            "valuation call exceeded deadline: {}",
            status.message()
        ));
    }
    TransportError::from(status)
}
