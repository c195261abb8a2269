//! Gateway configuration from flags and environment

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use propval_client::{ClientConfig, RetryPolicy};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; enables GraphiQL
    Development,
    /// Production
    Production,
    /// Automated tests
    Test,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Gateway settings.
#[derive(Debug, Clone, Parser)]
#[command(name = "propval-gateway")]
#[command(about = "REST and GraphQL gateway for the property valuation service", long_about = None)]
pub struct GatewayConfig {
    /// Valuation service address
    #[arg(long, env = "GRPC_SERVER", default_value = propval_client::config::DEFAULT_ADDRESS)]
    pub grpc_server: String,

    /// Deadline for each valuation call, in milliseconds
    #[arg(long, env = "GRPC_TIMEOUT_MS", default_value_t = 5000)]
    pub grpc_timeout_ms: u64,

    /// Retries after an unavailable service before giving up
    #[arg(long, env = "GRPC_MAX_RETRIES", default_value_t = 3)]
    pub grpc_max_retries: u32,

    /// Fixed delay between retries, in milliseconds
    #[arg(long, env = "GRPC_RETRY_DELAY_MS", default_value_t = 5000)]
    pub grpc_retry_delay_ms: u64,

    /// Listen host
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Requests allowed per client per window
    #[arg(long, env = "RATE_LIMIT_MAX", default_value_t = 100)]
    pub rate_limit_max: u32,

    /// Rate limit window, in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 900)]
    pub rate_limit_window_secs: u64,

    /// Deployment environment
    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Production)]
    pub environment: Environment,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            grpc_server: propval_client::config::DEFAULT_ADDRESS.to_string(),
            grpc_timeout_ms: 5000,
            grpc_max_retries: 3,
            grpc_retry_delay_ms: 5000,
            host: "0.0.0.0".to_string(),
            port: 4000,
            rate_limit_max: 100,
            rate_limit_window_secs: 900,
            environment: Environment::Production,
            log_format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Checks values that would otherwise fail later, at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        propval_client::transport::endpoint_for(&self.grpc_server)
            .with_context(|| format!("invalid gRPC server address: {}", self.grpc_server))?;
        if self.grpc_timeout_ms == 0 {
            bail!("gRPC timeout must be greater than zero");
        }
        if self.rate_limit_max == 0 {
            bail!("rate limit max must be greater than zero");
        }
        if self.rate_limit_window_secs == 0 {
            bail!("rate limit window must be greater than zero");
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Settings for the shared valuation client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.grpc_server.clone())
            .with_call_timeout(Duration::from_millis(self.grpc_timeout_ms))
            .with_retry(RetryPolicy::new(
                self.grpc_max_retries,
                Duration::from_millis(self.grpc_retry_delay_ms),
            ))
    }

    /// Listen address.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Rate limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// GraphiQL is served in development only.
    pub fn graphiql_enabled(&self) -> bool {
        self.environment == Environment::Development
    }
}
