//! Valuation request/result model
//!
//! Enum fields have a single canonical text form, lowercase snake_case, which is what
//! travels on the wire. Gateways normalize their inputs into these types; bounds checks on
//! the numeric fields happen at the gateway, not here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string is not the canonical form of an enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Name of the enum being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All values, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Kind of property being valued
    PropertyType, "property type" {
        /// Detached house
        House => "house",
        /// Apartment
        Apartment => "apartment",
        /// Condominium unit
        Condo => "condo",
        /// Townhouse
        Townhouse => "townhouse",
    }
}

wire_enum! {
    /// Condition grade, used for both the condition and the maintenance level
    Condition, "condition" {
        /// Excellent
        Excellent => "excellent",
        /// Good
        Good => "good",
        /// Fair
        Fair => "fair",
        /// Poor
        Poor => "poor",
    }
}

wire_enum! {
    /// Renovation state of the property
    RenovationStatus, "renovation status" {
        /// Renovated recently
        RecentlyRenovated => "recently_renovated",
        /// Standard
        Standard => "standard",
        /// In need of renovation
        NeedsRenovation => "needs_renovation",
    }
}

/// Canonical input to a valuation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    /// Street address
    pub address: String,
    /// Property type
    pub property_type: PropertyType,
    /// Number of bedrooms
    pub bedrooms: u32,
    /// Number of bathrooms (half baths allowed)
    pub bathrooms: f64,
    /// Living area in square feet
    pub square_footage: u32,
    /// Construction year
    pub year_built: i32,
    /// Overall condition
    pub condition: Condition,
    /// Maintenance level
    pub maintenance_level: Condition,
    /// Renovation status
    pub renovation_status: RenovationStatus,
}

/// Address used by the connection probe.
pub const PROBE_ADDRESS: &str = "test";

impl ValuationRequest {
    /// Minimal well-formed request used to prove the service is reachable.
    pub fn probe() -> Self {
        Self {
            address: PROBE_ADDRESS.to_string(),
            property_type: PropertyType::House,
            bedrooms: 1,
            bathrooms: 1.0,
            square_footage: 100,
            year_built: 2000,
            condition: Condition::Good,
            maintenance_level: Condition::Good,
            renovation_status: RenovationStatus::Standard,
        }
    }

    /// True if this is the synthetic probe request.
    pub fn is_probe(&self) -> bool {
        *self == Self::probe()
    }
}

/// Output of a successful valuation. Passed through untouched by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Estimated value in currency units
    pub value: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable explanation
    pub explanation: String,
}

impl ValuationResult {
    /// Creates a result.
    pub fn new(value: f64, confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            explanation: explanation.into(),
        }
    }
}
