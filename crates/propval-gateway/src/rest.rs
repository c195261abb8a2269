//! REST adapter

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use propval_client::ValuationResult;
use serde_json::{json, Value};
use tracing::error;

use crate::error::GatewayError;
use crate::health::{self, HealthReport};
use crate::state::AppState;
use crate::validation::{parse_rest_body, FieldError};

/// `GET /api`: self-documentation of the HTTP surface.
pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "name": "Property Valuation API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/calculate": {
                "description": "Calculate the value of a property",
                "body": {
                    "address": "string, required",
                    "property_type": "house | apartment | condo | townhouse",
                    "bedrooms": "integer >= 0",
                    "bathrooms": "number >= 0",
                    "square_footage": "integer >= 0",
                    "year_built": "integer, 1800 to the current year",
                    "condition": "excellent | good | fair | poor",
                    "maintenance_level": "excellent | good | fair | poor",
                    "renovation_status": "recently_renovated | standard | needs_renovation"
                }
            },
            "GET /api/health": {
                "description": "Gateway health and valuation service connectivity"
            },
            "POST /graphql": {
                "description": "GraphQL endpoint: calculateValuation(property: PropertyInput!)"
            }
        }
    }))
}

/// `POST /api/calculate`
pub async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValuationResult>, GatewayError> {
    let outcome = match body {
        Ok(Json(body)) => match parse_rest_body(&body) {
            Ok(request) => state
                .service
                .calculate_valuation(request)
                .await
                .map_err(GatewayError::from),
            Err(errors) => Err(GatewayError::Validation(errors)),
        },
        Err(rejection) => Err(GatewayError::Validation(vec![FieldError::new(
            "body",
            rejection.body_text(),
        )])),
    };

    outcome.map(Json).map_err(|e| {
        error!(code = e.code(), "Valuation request failed: {}", e);
        e
    })
}

/// `GET /api/health`. Always 200.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health::check(state.service.as_ref()).await)
}
