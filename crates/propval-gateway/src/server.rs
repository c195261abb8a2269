//! Router assembly and the HTTP server loop

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use propval_client::ValuationService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::graphql::{self, GRAPHQL_PATH};
use crate::rest;
use crate::security::{rate_limit_middleware, security_headers_middleware};
use crate::state::AppState;

/// Builds the full router: REST under `/api` (rate limited), GraphQL at `/graphql`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api", get(rest::api_docs))
        .route("/api/calculate", post(rest::calculate))
        .route("/api/health", get(rest::health))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let graphql_route = if state.config.graphiql_enabled() {
        get(graphql::graphiql_handler).post(graphql::graphql_handler)
    } else {
        post(graphql::graphql_handler)
    };

    Router::new()
        .merge(api)
        .route(GRAPHQL_PATH, graphql_route)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl-C or SIGTERM, then drains in-flight requests.
pub async fn serve(config: GatewayConfig, service: Arc<dyn ValuationService>) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let graphiql = config.graphiql_enabled();
    let router = build_router(AppState::new(service, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gateway listening on http://{}", addr);
    info!("REST API available at http://{}/api", addr);
    info!("GraphQL endpoint available at http://{}{}", addr, GRAPHQL_PATH);
    if graphiql {
        info!("GraphiQL enabled at http://{}{}", addr, GRAPHQL_PATH);
    }

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
