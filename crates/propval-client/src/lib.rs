#![warn(missing_docs)]

//! Property valuation client: gRPC transport binding, connection state machine and
//! retry-aware invoker shared by the REST and GraphQL gateways.

pub mod config;
pub mod connection;
pub mod error;
pub mod invoker;
pub mod proto;
pub mod retry;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::ClientConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{ErrorKind, Result, TransportError};
pub use invoker::{ValuationInvoker, ValuationService};
pub use retry::{RetryContext, RetryPolicy};
pub use transport::{call_with_deadline, GrpcTransport, ValuationTransport};
pub use types::{Condition, PropertyType, RenovationStatus, ValuationRequest, ValuationResult};
