//! GraphQL adapter
//!
//! `Query.calculateValuation` and `Mutation.calculateValuation` run the same resolver. Enum
//! inputs arrive in GraphQL's upper snake case and are lowercased into the canonical wire
//! form before the request is built, so results match the REST path exactly.

use async_graphql::http::GraphiQLSource;
use async_graphql::{
    Context, EmptySubscription, Enum, InputObject, InputType, Object, Schema, SimpleObject,
};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use propval_client::types as domain;
use propval_client::ValuationService;
use std::sync::Arc;
use tracing::error;

use crate::error::GatewayError;
use crate::state::AppState;
use crate::validation::{messages, Checker};

/// Path the GraphQL endpoint is served on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Kind of property.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum PropertyType {
    /// Detached house
    House,
    /// Apartment
    Apartment,
    /// Condominium unit
    Condo,
    /// Townhouse
    Townhouse,
}

/// Overall condition grade.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum PropertyCondition {
    /// Excellent
    Excellent,
    /// Good
    Good,
    /// Fair
    Fair,
    /// Poor
    Poor,
}

/// Maintenance grade.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaintenanceLevel {
    /// Excellent
    Excellent,
    /// Good
    Good,
    /// Fair
    Fair,
    /// Poor
    Poor,
}

/// Renovation state.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RenovationStatus {
    /// Renovated recently
    RecentlyRenovated,
    /// Standard
    Standard,
    /// In need of renovation
    NeedsRenovation,
}

/// Property to value.
#[derive(InputObject, Clone, Debug)]
pub struct PropertyInput {
    /// Street address
    pub address: String,
    /// Property type
    pub property_type: PropertyType,
    /// Number of bedrooms
    pub bedrooms: i32,
    /// Number of bathrooms
    pub bathrooms: f64,
    /// Living area in square feet
    pub square_footage: i32,
    /// Construction year
    pub year_built: i32,
    /// Overall condition
    pub condition: PropertyCondition,
    /// Maintenance level
    pub maintenance_level: MaintenanceLevel,
    /// Renovation status
    pub renovation_status: RenovationStatus,
}

/// GraphQL enum item name (`RECENTLY_RENOVATED`, ...).
fn item_name<E: InputType>(value: &E) -> String {
    match value.to_value() {
        async_graphql::Value::Enum(name) => name.as_str().to_string(),
        other => other.to_string(),
    }
}

impl PropertyInput {
    /// Validates the input and builds the canonical request.
    pub fn into_request(self) -> Result<domain::ValuationRequest, GatewayError> {
        let mut check = Checker::new();

        let address = check.address("address", &self.address);
        let property_type = check.wire_enum::<domain::PropertyType>(
            "propertyType",
            &item_name(&self.property_type),
            messages::PROPERTY_TYPE,
        );
        let bedrooms = check.count(
            "bedrooms",
            i64::from(self.bedrooms),
            messages::BEDROOMS,
        );
        let bathrooms = check.bathrooms("bathrooms", self.bathrooms);
        let square_footage = check.count(
            "squareFootage",
            i64::from(self.square_footage),
            messages::SQUARE_FOOTAGE,
        );
        let year_built = check.year_built("yearBuilt", i64::from(self.year_built));
        let condition = check.wire_enum::<domain::Condition>(
            "condition",
            &item_name(&self.condition),
            messages::CONDITION,
        );
        let maintenance_level = check.wire_enum::<domain::Condition>(
            "maintenanceLevel",
            &item_name(&self.maintenance_level),
            messages::MAINTENANCE_LEVEL,
        );
        let renovation_status = check.wire_enum::<domain::RenovationStatus>(
            "renovationStatus",
            &item_name(&self.renovation_status),
            messages::RENOVATION_STATUS,
        );

        check.finish().map_err(GatewayError::Validation)?;

        match (
            address,
            property_type,
            bedrooms,
            bathrooms,
            square_footage,
            year_built,
            condition,
            maintenance_level,
            renovation_status,
        ) {
            (
                Some(address),
                Some(property_type),
                Some(bedrooms),
                Some(bathrooms),
                Some(square_footage),
                Some(year_built),
                Some(condition),
                Some(maintenance_level),
                Some(renovation_status),
            ) => Ok(domain::ValuationRequest {
                address,
                property_type,
                bedrooms,
                bathrooms,
                square_footage,
                year_built,
                condition,
                maintenance_level,
                renovation_status,
            }),
            _ => Err(GatewayError::Internal {
                reason: "incomplete property input".to_string(),
            }),
        }
    }
}

/// Valuation returned to GraphQL callers.
#[derive(SimpleObject, Clone, Debug, PartialEq)]
#[graphql(name = "ValuationResult")]
pub struct Valuation {
    /// Estimated value
    pub value: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable explanation
    pub explanation: String,
}

impl From<domain::ValuationResult> for Valuation {
    fn from(result: domain::ValuationResult) -> Self {
        Self {
            value: result.value,
            confidence: result.confidence,
            explanation: result.explanation,
        }
    }
}

async fn resolve_valuation(
    ctx: &Context<'_>,
    property: PropertyInput,
) -> async_graphql::Result<Valuation> {
    let service = ctx.data::<Arc<dyn ValuationService>>()?;

    let outcome = match property.into_request() {
        Ok(request) => service
            .calculate_valuation(request)
            .await
            .map_err(GatewayError::from),
        Err(e) => Err(e),
    };

    outcome.map(Valuation::from).map_err(|e| {
        error!(code = e.code(), "GraphQL valuation failed: {}", e);
        e.into_graphql()
    })
}

/// Query root.
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Values a property.
    async fn calculate_valuation(
        &self,
        ctx: &Context<'_>,
        property: PropertyInput,
    ) -> async_graphql::Result<Valuation> {
        resolve_valuation(ctx, property).await
    }
}

/// Mutation root; mirrors the query for client compatibility.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Values a property.
    async fn calculate_valuation(
        &self,
        ctx: &Context<'_>,
        property: PropertyInput,
    ) -> async_graphql::Result<Valuation> {
        resolve_valuation(ctx, property).await
    }
}

/// The gateway's GraphQL schema.
pub type ValuationSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema around the shared valuation service.
pub fn build_schema(service: Arc<dyn ValuationService>) -> ValuationSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// `POST /graphql`
pub async fn graphql_handler(
    State(state): State<AppState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(state.schema.execute(request).await)
}

/// `GET /graphql`, development only.
pub async fn graphiql_handler() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}
