//! Property valuation gateway binary

use clap::Parser;
use propval_client::{ValuationInvoker, ValuationService};
use propval_gateway::config::{GatewayConfig, LogFormat};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::parse();
    init_tracing(config.log_format);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:#}", e);
        std::process::exit(1);
    }

    info!(
        grpc_server = %config.grpc_server,
        environment = ?config.environment,
        "Property valuation gateway starting"
    );

    let service: Arc<dyn ValuationService> =
        Arc::new(ValuationInvoker::grpc(config.client_config()));

    propval_gateway::server::serve(config, service).await
}
