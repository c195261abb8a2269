//! Gateway error type and its HTTP / GraphQL renderings

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use propval_client::{ErrorKind, TransportError};
use serde_json::json;
use thiserror::Error;

use crate::validation::FieldError;

/// Code for rejected input fields.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Code for a client over its request budget.
pub const RATE_LIMITED: &str = "RATE_LIMITED";
/// Code for failures without a recognized transport code.
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// Errors surfaced to gateway callers.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// One or more input fields failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    /// The valuation client failed
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Per-client request budget exhausted
    #[error("Too many requests, please try again later.")]
    RateLimited,
    /// Anything else
    #[error("Internal server error: {reason}")]
    Internal {
        /// What went wrong
        reason: String,
    },
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Transport(e) => match e.kind() {
                ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => VALIDATION_ERROR,
            GatewayError::Transport(e) => e.code(),
            GatewayError::RateLimited => RATE_LIMITED,
            GatewayError::Internal { .. } => INTERNAL_SERVER_ERROR,
        }
    }

    /// Field errors, for validation failures.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            GatewayError::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// `{"error": {"message", "code"}}`, plus `errors` for validation failures.
    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "error": {
                "message": self.to_string(),
                "code": self.code(),
            }
        });
        if let GatewayError::Validation(errors) = self {
            body["errors"] = json!(errors);
        }
        body
    }

    /// GraphQL error carrying the same message and `extensions.code`.
    pub fn into_graphql(self) -> async_graphql::Error {
        use async_graphql::ErrorExtensions;

        let code = self.code();
        let fields = match &self {
            GatewayError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("code", code.to_string());
            if let Some(list) = fields.and_then(|v| async_graphql::Value::from_json(v).ok()) {
                ext.set("errors", list);
            }
        })
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self.body())).into_response()
    }
}
