//! Gateway health check
//!
//! The gateway itself is always reported `ok`; the valuation service link is reported
//! separately and never turns the HTTP response into a failure.

use propval_client::ValuationService;
use serde::Serialize;
use tracing::warn;

/// Reachability of the valuation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GrpcHealth {
    /// A probe or live channel reached the service
    Connected,
    /// The service could not be reached
    Disconnected,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Always `ok` while the gateway can answer
    pub status: &'static str,
    /// Valuation service link
    pub grpc: GrpcHealth,
    /// Why the link is down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Service reachable.
    pub fn connected() -> Self {
        Self {
            status: "ok",
            grpc: GrpcHealth::Connected,
            error: None,
        }
    }

    /// Service unreachable.
    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            status: "ok",
            grpc: GrpcHealth::Disconnected,
            error: Some(error.into()),
        }
    }
}

/// Makes sure a connection exists (probing if needed, no retries) and reports the outcome.
pub async fn check(service: &dyn ValuationService) -> HealthReport {
    match service.check_connection().await {
        Ok(()) => HealthReport::connected(),
        Err(e) => {
            warn!(code = e.code(), "Health check could not reach valuation service: {}", e);
            HealthReport::disconnected(e.to_string())
        }
    }
}
