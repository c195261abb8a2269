//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use propval_client::mock::MockTransport;
use propval_client::{ClientConfig, RetryPolicy, ValuationInvoker, ValuationService};
use propval_gateway::config::{Environment, GatewayConfig};
use propval_gateway::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Retries allowed by the test client.
pub const MAX_RETRIES: u32 = 3;

/// Gateway wired to an in-process mock backend.
pub struct TestGateway {
    pub transport: Arc<MockTransport>,
    pub state: AppState,
}

impl TestGateway {
    pub fn new(transport: MockTransport) -> Self {
        Self::with_config(transport, test_config())
    }

    pub fn with_config(transport: MockTransport, config: GatewayConfig) -> Self {
        let transport = Arc::new(transport);
        let client = ClientConfig::new("mock:50051")
            .with_call_timeout(Duration::from_millis(config.grpc_timeout_ms))
            .with_retry(RetryPolicy::new(MAX_RETRIES, Duration::ZERO));
        let service: Arc<dyn ValuationService> =
            Arc::new(ValuationInvoker::new(transport.clone(), client));
        Self {
            transport,
            state: AppState::new(service, config),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        read_json(self.send(request).await).await
    }

    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        read_json(self.send(request).await).await
    }

    pub async fn graphql(&self, query: &str, variables: Value) -> Value {
        let (status, body) = self
            .post_json("/graphql", &json!({"query": query, "variables": variables}))
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        grpc_timeout_ms: 100,
        environment: Environment::Test,
        ..GatewayConfig::default()
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Well-formed REST body.
pub fn rest_body() -> Value {
    json!({
        "address": "123 Test St",
        "property_type": "house",
        "bedrooms": 3,
        "bathrooms": 2,
        "square_footage": 2000,
        "year_built": 2019,
        "condition": "good",
        "maintenance_level": "good",
        "renovation_status": "standard"
    })
}

pub const CALCULATE_QUERY: &str = r#"
query Calculate($property: PropertyInput!) {
  calculateValuation(property: $property) { value confidence explanation }
}"#;

pub const CALCULATE_MUTATION: &str = r#"
mutation Calculate($property: PropertyInput!) {
  calculateValuation(property: $property) { value confidence explanation }
}"#;

/// Well-formed GraphQL input matching [`rest_body`].
pub fn graphql_property() -> Value {
    json!({
        "address": "123 Test St",
        "propertyType": "HOUSE",
        "bedrooms": 3,
        "bathrooms": 2,
        "squareFootage": 2000,
        "yearBuilt": 2019,
        "condition": "GOOD",
        "maintenanceLevel": "GOOD",
        "renovationStatus": "STANDARD"
    })
}
