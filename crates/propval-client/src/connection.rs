//! Connection state machine
//!
//! One shared channel per process, guarded by a mutex that is never held across an
//! await. Concurrent callers that find the link down may each reconnect; the last one to
//! finish decides the final state.

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::transport::{call_with_deadline, ValuationTransport};
use crate::types::ValuationRequest;

/// Externally visible connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No believed-live channel
    Disconnected,
    /// A connect and probe is in flight
    Connecting,
    /// The last probe reached the service
    Connected,
}

impl ConnectionState {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The channel lives inside `Connected` so "connected without a channel" cannot exist.
enum Link<C> {
    Disconnected,
    Connecting,
    Connected(C),
}

impl<C> Link<C> {
    fn state(&self) -> ConnectionState {
        match self {
            Link::Disconnected => ConnectionState::Disconnected,
            Link::Connecting => ConnectionState::Connecting,
            Link::Connected(_) => ConnectionState::Connected,
        }
    }
}

/// Owns the shared channel and its liveness state.
pub struct ConnectionManager<T: ValuationTransport> {
    transport: Arc<T>,
    address: String,
    probe_timeout: Duration,
    link: Mutex<Link<T::Channel>>,
}

impl<T: ValuationTransport> ConnectionManager<T> {
    /// Creates a manager in the `Disconnected` state. No I/O happens until the first
    /// [`ensure_connected`](Self::ensure_connected).
    pub fn new(transport: Arc<T>, address: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            transport,
            address: address.into(),
            probe_timeout,
            link: Mutex::new(Link::Disconnected),
        }
    }

    /// Address of the remote service.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The transport used for probes and calls.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.lock().state()
    }

    /// Returns a believed-live channel, connecting and probing first unless already
    /// `Connected`.
    ///
    /// Only an `Unavailable` probe failure counts as unreachable. Any other probe failure
    /// means the service answered, so the channel is kept and the state becomes
    /// `Connected`.
    pub async fn ensure_connected(&self) -> Result<T::Channel> {
        {
            let mut link = self.lock();
            if let Link::Connected(channel) = &*link {
                return Ok(channel.clone());
            }
            *link = Link::Connecting;
        }

        info!("Connecting to valuation service at {}", self.address);

        let channel = match self.transport.open(&self.address) {
            Ok(channel) => channel,
            Err(e) => {
                error!("Failed to open channel to {}: {}", self.address, e);
                self.set(Link::Disconnected);
                return Err(e);
            }
        };

        let probe = ValuationRequest::probe();
        match call_with_deadline(&*self.transport, &channel, &probe, self.probe_timeout).await {
            Err(e) if e.is_unavailable() => {
                error!("Failed to connect to valuation service: {}", e);
                self.set(Link::Disconnected);
                Err(e)
            }
            outcome => {
                if let Err(e) = outcome {
                    debug!(code = e.code(), "Probe rejected but service reachable: {}", e);
                }
                self.set(Link::Connected(channel.clone()));
                info!("Successfully connected to valuation service");
                Ok(channel)
            }
        }
    }

    /// Drops the channel after an `Unavailable` call so the next caller reconnects.
    pub fn mark_disconnected(&self) {
        let mut link = self.lock();
        if matches!(*link, Link::Connected(_)) {
            warn!("Valuation service at {} became unavailable", self.address);
        }
        *link = Link::Disconnected;
    }

    fn set(&self, next: Link<T::Channel>) {
        *self.lock() = next;
    }

    fn lock(&self) -> MutexGuard<'_, Link<T::Channel>> {
        self.link.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TransportError};
    use crate::mock::MockTransport;

    const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

    fn manager(transport: MockTransport) -> (Arc<MockTransport>, ConnectionManager<MockTransport>) {
        let transport = Arc::new(transport);
        let manager = ConnectionManager::new(transport.clone(), "mock:50051", PROBE_TIMEOUT);
        (transport, manager)
    }

    #[test]
    fn test_starts_disconnected() {
        let (_, manager) = manager(MockTransport::new());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_successful_probe_connects() {
        let (transport, manager) = manager(MockTransport::new());

        let channel = manager.ensure_connected().await.unwrap();

        assert_eq!(channel.address, "mock:50051");
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(transport.probe_count(), 1);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connected_returns_existing_channel_without_io() {
        let (transport, manager) = manager(MockTransport::new());

        let first = manager.ensure_connected().await.unwrap();
        let second = manager.ensure_connected().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.open_count(), 1);
        assert_eq!(transport.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_probe_leaves_disconnected() {
        let (_, manager) = manager(MockTransport::unreachable());

        let err = manager.ensure_connected().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_rejected_probe_still_counts_as_connected() {
        let (_, manager) = manager(
            MockTransport::new()
                .fail_probes(1, TransportError::invalid_argument("Invalid property type")),
        );

        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_internal_probe_failure_still_counts_as_connected() {
        let (_, manager) =
            manager(MockTransport::new().fail_probes(1, TransportError::internal("boom")));

        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_still_counts_as_connected() {
        let (_, manager) = manager(MockTransport::new().with_latency(Duration::from_secs(10)));

        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_mark_disconnected_forces_reconnect() {
        let (transport, manager) = manager(MockTransport::new());

        manager.ensure_connected().await.unwrap();
        manager.mark_disconnected();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        let channel = manager.ensure_connected().await.unwrap();
        assert_eq!(channel.id, 2);
        assert_eq!(transport.open_count(), 2);
        assert_eq!(transport.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_recovers_after_unavailable_probe() {
        let (_, manager) = manager(
            MockTransport::new().fail_probes(1, TransportError::unavailable("refused")),
        );

        assert!(manager.ensure_connected().await.is_err());
        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_is_connecting_while_probe_in_flight() {
        let (_, manager) = manager(MockTransport::new().with_latency(Duration::from_millis(50)));
        let manager = Arc::new(manager);

        let task = tokio::spawn({
            let manager = manager.clone();
            async move { manager.ensure_connected().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert!(task.await.unwrap().is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connects_end_connected() {
        let (transport, manager) = manager(MockTransport::new().with_latency(Duration::from_millis(5)));
        let manager = Arc::new(manager);

        let (a, b) = tokio::join!(
            {
                let manager = manager.clone();
                async move { manager.ensure_connected().await }
            },
            {
                let manager = manager.clone();
                async move { manager.ensure_connected().await }
            }
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(transport.open_count() >= 1 && transport.open_count() <= 2);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(
            serde_json_name(ConnectionState::Disconnected),
            "\"disconnected\""
        );
    }

    fn serde_json_name(state: ConnectionState) -> String {
        serde_json::to_string(&state).unwrap()
    }
}
