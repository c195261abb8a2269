//! Protobuf messages and unary client stub for `valuation.ValuationService`
//!
//! Mirrors `proto/valuation.proto`. Written in the shape tonic-build generates so the
//! workspace builds without protoc.

use crate::error::TransportError;
use crate::types;

/// Property description as sent on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Property {
    /// Street address
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
    /// Property type, lowercase snake_case
    #[prost(string, tag = "2")]
    pub property_type: ::prost::alloc::string::String,
    /// Bedrooms
    #[prost(int32, tag = "3")]
    pub bedrooms: i32,
    /// Bathrooms
    #[prost(double, tag = "4")]
    pub bathrooms: f64,
    /// Square footage
    #[prost(int32, tag = "5")]
    pub square_footage: i32,
    /// Year built
    #[prost(int32, tag = "6")]
    pub year_built: i32,
    /// Condition, lowercase
    #[prost(string, tag = "7")]
    pub condition: ::prost::alloc::string::String,
    /// Maintenance level, lowercase
    #[prost(string, tag = "8")]
    pub maintenance_level: ::prost::alloc::string::String,
    /// Renovation status, lowercase snake_case
    #[prost(string, tag = "9")]
    pub renovation_status: ::prost::alloc::string::String,
    /// Optional feature tags; never set by the gateways
    #[prost(string, repeated, tag = "10")]
    pub features: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Request envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValuationRequest {
    /// The property to value
    #[prost(message, optional, tag = "1")]
    pub property: ::core::option::Option<Property>,
}

/// Valuation outcome as returned by the service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValuationResult {
    /// Estimated value
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Confidence in [0, 1]
    #[prost(double, tag = "2")]
    pub confidence: f64,
    /// Explanation
    #[prost(string, tag = "3")]
    pub explanation: ::prost::alloc::string::String,
    /// Data-quality issues noted by the service
    #[prost(string, repeated, tag = "4")]
    pub issues: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Response envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ValuationResponse {
    /// The result, absent only on a malformed response
    #[prost(message, optional, tag = "1")]
    pub result: ::core::option::Option<ValuationResult>,
}

impl TryFrom<&types::ValuationRequest> for ValuationRequest {
    type Error = TransportError;

    /// Fails with `InvalidArgument` if a count does not fit the `int32` wire field.
    fn try_from(req: &types::ValuationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            property: Some(Property {
                address: req.address.clone(),
                property_type: req.property_type.as_str().to_string(),
                bedrooms: wire_i32("bedrooms", req.bedrooms)?,
                bathrooms: req.bathrooms,
                square_footage: wire_i32("square_footage", req.square_footage)?,
                year_built: req.year_built,
                condition: req.condition.as_str().to_string(),
                maintenance_level: req.maintenance_level.as_str().to_string(),
                renovation_status: req.renovation_status.as_str().to_string(),
                features: Vec::new(),
            }),
        })
    }
}

fn wire_i32(field: &str, v: u32) -> Result<i32, TransportError> {
    i32::try_from(v)
        .map_err(|_| TransportError::invalid_argument(format!("{} out of range: {}", field, v)))
}

impl TryFrom<ValuationResponse> for types::ValuationResult {
    type Error = TransportError;

    fn try_from(resp: ValuationResponse) -> Result<Self, Self::Error> {
        let result = resp
            .result
            .ok_or_else(|| TransportError::internal("valuation response carried no result"))?;
        Ok(types::ValuationResult {
            value: result.value,
            confidence: result.confidence,
            explanation: result.explanation,
        })
    }
}

/// Client stub for `valuation.ValuationService`.
pub mod valuation_service_client {
    use tonic::codegen::*;

    /// Fully-qualified service name.
    pub const SERVICE_NAME: &str = "valuation.ValuationService";

    /// Unary client for the valuation service.
    #[derive(Debug, Clone)]
    pub struct ValuationServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl<T> ValuationServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        /// Wraps an established (or lazily connecting) channel.
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        /// `rpc CalculateValuation (ValuationRequest) returns (ValuationResponse)`
        pub async fn calculate_valuation(
            &mut self,
            request: impl tonic::IntoRequest<super::ValuationRequest>,
        ) -> std::result::Result<tonic::Response<super::ValuationResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/valuation.ValuationService/CalculateValuation",
            );
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new(SERVICE_NAME, "CalculateValuation"));
            self.inner.unary(req, path, codec).await
        }
    }
}
