//! REST and GraphQL build the same request for the same property.

mod common;

use common::{TestGateway, CALCULATE_QUERY};
use propval_client::mock::MockTransport;
use propval_client::proto;
use propval_client::{Condition, PropertyType, RenovationStatus, ValuationRequest};
use proptest::prelude::*;
use prost::Message;
use serde_json::{json, Value};

fn arb_request() -> impl Strategy<Value = ValuationRequest> {
    (
        "[1-9][0-9]{0,3} [A-Z][a-z]{2,8} (St|Ave|Rd)",
        prop::sample::select(PropertyType::ALL.to_vec()),
        0u32..20,
        (0u32..16).prop_map(|halves| f64::from(halves) * 0.5),
        0u32..10_000,
        1800i32..=2024,
        prop::sample::select(Condition::ALL.to_vec()),
        prop::sample::select(Condition::ALL.to_vec()),
        prop::sample::select(RenovationStatus::ALL.to_vec()),
    )
        .prop_map(
            |(
                address,
                property_type,
                bedrooms,
                bathrooms,
                square_footage,
                year_built,
                condition,
                maintenance_level,
                renovation_status,
            )| ValuationRequest {
                address,
                property_type,
                bedrooms,
                bathrooms,
                square_footage,
                year_built,
                condition,
                maintenance_level,
                renovation_status,
            },
        )
}

fn mixed_case(text: &str, upper: bool) -> String {
    if upper {
        format!(" {} ", text.to_uppercase())
    } else {
        text.to_string()
    }
}

fn rest_body(req: &ValuationRequest, upper: bool) -> Value {
    json!({
        "address": req.address,
        "property_type": mixed_case(req.property_type.as_str(), upper),
        "bedrooms": req.bedrooms,
        "bathrooms": req.bathrooms,
        "square_footage": req.square_footage,
        "year_built": req.year_built,
        "condition": mixed_case(req.condition.as_str(), upper),
        "maintenance_level": mixed_case(req.maintenance_level.as_str(), upper),
        "renovation_status": mixed_case(req.renovation_status.as_str(), upper),
    })
}

fn graphql_property(req: &ValuationRequest) -> Value {
    json!({
        "address": req.address,
        "propertyType": req.property_type.as_str().to_uppercase(),
        "bedrooms": req.bedrooms,
        "bathrooms": req.bathrooms,
        "squareFootage": req.square_footage,
        "yearBuilt": req.year_built,
        "condition": req.condition.as_str().to_uppercase(),
        "maintenanceLevel": req.maintenance_level.as_str().to_uppercase(),
        "renovationStatus": req.renovation_status.as_str().to_uppercase(),
    })
}

async fn send_both(req: &ValuationRequest, upper: bool) -> (Vec<ValuationRequest>, Vec<ValuationRequest>) {
    let rest = TestGateway::new(MockTransport::new());
    let (status, _) = rest.post_json("/api/calculate", &rest_body(req, upper)).await;
    assert_eq!(status, axum::http::StatusCode::OK);

    let graphql = TestGateway::new(MockTransport::new());
    let body = graphql
        .graphql(CALCULATE_QUERY, json!({"property": graphql_property(req)}))
        .await;
    assert!(body.get("errors").is_none(), "{body}");

    (rest.transport.requests(), graphql.transport.requests())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rest_and_graphql_send_identical_requests(req in arb_request(), upper in any::<bool>()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (rest, graphql) = runtime.block_on(send_both(&req, upper));

        prop_assert_eq!(rest.len(), 1);
        prop_assert_eq!(graphql.len(), 1);
        prop_assert_eq!(&rest[0], &req);
        prop_assert_eq!(&rest[0], &graphql[0]);

        let rest_wire = proto::ValuationRequest::try_from(&rest[0]).unwrap().encode_to_vec();
        let graphql_wire = proto::ValuationRequest::try_from(&graphql[0]).unwrap().encode_to_vec();
        prop_assert_eq!(rest_wire, graphql_wire);
    }
}
