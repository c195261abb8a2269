#![warn(missing_docs)]

//! Property valuation gateway: REST and GraphQL adapters over one shared valuation client.

pub mod config;
pub mod error;
pub mod graphql;
pub mod health;
pub mod rest;
pub mod security;
pub mod server;
pub mod state;
pub mod validation;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::{build_router, serve};
pub use state::AppState;
