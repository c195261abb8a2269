//! Shared application state

use propval_client::ValuationService;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::graphql::{build_schema, ValuationSchema};
use crate::security::RateLimiter;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The single shared valuation client
    pub service: Arc<dyn ValuationService>,
    /// GraphQL schema wired to `service`
    pub schema: ValuationSchema,
    /// Gateway settings
    pub config: Arc<GatewayConfig>,
    /// Per-client request budget
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Builds state around one service instance shared by both adapters.
    pub fn new(service: Arc<dyn ValuationService>, config: GatewayConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window(),
        ));
        Self {
            schema: build_schema(service.clone()),
            service,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}
