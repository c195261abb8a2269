//! Field validation and normalization at the gateway boundary
//!
//! Both adapters run every rule and report all failing fields at once. Enum text is trimmed
//! and lowercased before parsing so the request handed to the client is identical whichever
//! adapter built it.

use chrono::Datelike;
use propval_client::{Condition, PropertyType, RenovationStatus, ValuationRequest};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Oldest accepted construction year.
pub const MIN_YEAR_BUILT: i64 = 1800;

/// Largest accepted bedroom count or square footage; both travel as `int32`.
pub const MAX_COUNT: i64 = i32::MAX as i64;

/// Messages reported for each field.
pub mod messages {
    /// address
    pub const ADDRESS: &str = "Address is required";
    /// property_type
    pub const PROPERTY_TYPE: &str = "Invalid property type";
    /// bedrooms
    pub const BEDROOMS: &str = "Bedrooms must be a positive integer";
    /// bathrooms
    pub const BATHROOMS: &str = "Bathrooms must be a positive number";
    /// square_footage
    pub const SQUARE_FOOTAGE: &str = "Square footage must be a positive integer";
    /// year_built
    pub const YEAR_BUILT: &str = "Invalid year built";
    /// condition
    pub const CONDITION: &str = "Invalid condition";
    /// maintenance_level
    pub const MAINTENANCE_LEVEL: &str = "Invalid maintenance level";
    /// renovation_status
    pub const RENOVATION_STATUS: &str = "Invalid renovation status";
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Field name, in the caller's naming convention
    pub field: String,
    /// Human-readable reason
    pub message: String,
    /// Offending value, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FieldError {
    /// Error without an offending value.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Error carrying the rejected value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Current calendar year (UTC), the newest accepted construction year.
pub fn current_year() -> i64 {
    i64::from(chrono::Utc::now().year())
}

/// Collects field errors while a request is being assembled.
#[derive(Debug, Default)]
pub struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    /// Empty checker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Non-empty address.
    pub fn address(&mut self, field: &str, value: &str) -> Option<String> {
        if value.is_empty() {
            self.push(FieldError::new(field, messages::ADDRESS));
            return None;
        }
        Some(value.to_string())
    }

    /// Integer in `[0, MAX_COUNT]`.
    pub fn count(&mut self, field: &str, value: i64, message: &str) -> Option<u32> {
        match u32::try_from(value) {
            Ok(v) if value <= MAX_COUNT => Some(v),
            _ => {
                self.push(FieldError::new(field, message).with_value(Value::from(value)));
                None
            }
        }
    }

    /// Finite, non-negative number of bathrooms.
    pub fn bathrooms(&mut self, field: &str, value: f64) -> Option<f64> {
        if value.is_finite() && value >= 0.0 {
            return Some(value);
        }
        let shown = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.push(FieldError::new(field, messages::BATHROOMS).with_value(shown));
        None
    }

    /// Year between [`MIN_YEAR_BUILT`] and the current year.
    pub fn year_built(&mut self, field: &str, value: i64) -> Option<i32> {
        if (MIN_YEAR_BUILT..=current_year()).contains(&value) {
            if let Ok(year) = i32::try_from(value) {
                return Some(year);
            }
        }
        self.push(FieldError::new(field, messages::YEAR_BUILT).with_value(Value::from(value)));
        None
    }

    /// Enum text, normalized to lowercase before parsing.
    pub fn wire_enum<E: FromStr>(&mut self, field: &str, value: &str, message: &str) -> Option<E> {
        match normalize_enum_text(value).parse::<E>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.push(FieldError::new(field, message).with_value(Value::from(value)));
                None
            }
        }
    }

    /// Returns the collected errors, if any.
    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Trims and lowercases enum text.
pub fn normalize_enum_text(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Parses and validates a REST body (snake_case field names).
pub fn parse_rest_body(body: &Value) -> Result<ValuationRequest, Vec<FieldError>> {
    let Some(obj) = body.as_object() else {
        return Err(vec![FieldError::new("body", "Request body must be a JSON object")]);
    };

    let mut check = Checker::new();

    let address = match obj.get("address") {
        Some(Value::String(s)) => check.address("address", s),
        Some(other) => {
            check.push(FieldError::new("address", messages::ADDRESS).with_value(other.clone()));
            None
        }
        None => {
            check.push(FieldError::new("address", messages::ADDRESS));
            None
        }
    };

    let property_type =
        rest_enum::<PropertyType>(&mut check, obj, "property_type", messages::PROPERTY_TYPE);
    let bedrooms = rest_integer(&mut check, obj, "bedrooms", messages::BEDROOMS)
        .and_then(|v| check.count("bedrooms", v, messages::BEDROOMS));
    let bathrooms = match obj.get("bathrooms") {
        Some(raw) => match as_number(raw) {
            Some(v) => check.bathrooms("bathrooms", v),
            None => {
                check.push(FieldError::new("bathrooms", messages::BATHROOMS).with_value(raw.clone()));
                None
            }
        },
        None => {
            check.push(FieldError::new("bathrooms", messages::BATHROOMS));
            None
        }
    };
    let square_footage = rest_integer(&mut check, obj, "square_footage", messages::SQUARE_FOOTAGE)
        .and_then(|v| check.count("square_footage", v, messages::SQUARE_FOOTAGE));
    let year_built = rest_integer(&mut check, obj, "year_built", messages::YEAR_BUILT)
        .and_then(|v| check.year_built("year_built", v));
    let condition = rest_enum::<Condition>(&mut check, obj, "condition", messages::CONDITION);
    let maintenance_level = rest_enum::<Condition>(
        &mut check,
        obj,
        "maintenance_level",
        messages::MAINTENANCE_LEVEL,
    );
    let renovation_status = rest_enum::<RenovationStatus>(
        &mut check,
        obj,
        "renovation_status",
        messages::RENOVATION_STATUS,
    );

    check.finish()?;

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
        ) => Ok(ValuationRequest {
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
        // Every None above pushed an error, so finish() already returned.
        _ => Err(vec![FieldError::new("body", "Incomplete request")]),
    }
}

fn rest_enum<E: FromStr>(
    check: &mut Checker,
    obj: &Map<String, Value>,
    field: &str,
    message: &str,
) -> Option<E> {
    match obj.get(field) {
        Some(Value::String(s)) => check.wire_enum(field, s, message),
        Some(other) => {
            check.push(FieldError::new(field, message).with_value(other.clone()));
            None
        }
        None => {
            check.push(FieldError::new(field, message));
            None
        }
    }
}

fn rest_integer(
    check: &mut Checker,
    obj: &Map<String, Value>,
    field: &str,
    message: &str,
) -> Option<i64> {
    match obj.get(field) {
        Some(raw) => {
            let parsed = as_integer(raw);
            if parsed.is_none() {
                check.push(FieldError::new(field, message).with_value(raw.clone()));
            }
            parsed
        }
        None => {
            check.push(FieldError::new(field, message));
            None
        }
    }
}

/// Integer from a JSON number (integral floats included) or a numeric string.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Number from a JSON number or a numeric string.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
