//! Parameter definitions for the CRUD tools
//!
//! The typed structs give MCP clients a JSON schema; the dispatcher itself
//! works on the loosely-typed [`ParamBag`] so one engine serves every
//! entity.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Field;
use crate::error::CrudError;
use crate::value::{parse_decimal, SqlValue, ValueKind};

/// Loosely-typed request parameters, keyed by parameter name
pub type ParamBag = serde_json::Map<String, Value>;

// ============================================================================
// Tool Parameters
// ============================================================================

// Values stay raw JSON so coercion and its messages happen in one place;
// the schema still advertises the intended types.

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CustomerCrudParams {
    /// One of: create, read, update, delete, describe
    pub operation: String,
    /// Customer name (create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub name: Option<Value>,
    /// Customer email (create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub email: Option<Value>,
    /// Maximum number of rows to return (read); omit for all rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<u32>")]
    pub limit: Option<Value>,
    /// Customer id (update, delete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<u32>")]
    pub customer_id: Option<Value>,
    /// Replacement email (update)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub new_email: Option<Value>,
    /// Table to describe (describe)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub table_name: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductCrudParams {
    /// One of: create, read, update, delete, describe
    pub operation: String,
    /// Product name (create; delete when product_id is absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub name: Option<Value>,
    /// Unit price (create)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub price: Option<Value>,
    /// Free-form description (create, optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub description: Option<Value>,
    /// Maximum number of rows to return (read); omit for all rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<u32>")]
    pub limit: Option<Value>,
    /// Product id (update; delete, preferred over name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<u32>")]
    pub product_id: Option<Value>,
    /// Replacement price (update)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub new_price: Option<Value>,
    /// Table to describe (describe)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub table_name: Option<Value>,
}

/// Flatten typed tool parameters into a bag
pub fn to_bag<T: Serialize>(params: &T) -> Result<ParamBag, serde_json::Error> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        _ => Ok(ParamBag::new()),
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// Read one field out of the bag, converted to its SQL value.
///
/// `Ok(None)` means absent: missing key, JSON null, or blank text.
pub fn take(bag: &ParamBag, field: &Field) -> Result<Option<SqlValue>, CrudError> {
    let Some(raw) = bag.get(field.param).filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    match field.kind {
        ValueKind::Integer => positive_integer(raw)
            .map(|v| Some(SqlValue::Int(v)))
            .ok_or_else(|| {
                CrudError::validation(format!("'{}' must be a positive integer.", field.param))
            }),
        ValueKind::Decimal => decimal(raw)
            .map(|v| Some(SqlValue::Decimal(v)))
            .ok_or_else(|| CrudError::validation(format!("'{}' must be a number.", field.param))),
        ValueKind::Text | ValueKind::Timestamp => match raw {
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(SqlValue::Text(s.clone()))),
            _ => Err(CrudError::validation(format!(
                "'{}' must be a string.",
                field.param
            ))),
        },
    }
}

fn positive_integer(raw: &Value) -> Option<i64> {
    let value = match raw {
        // `as` saturates, so whole floats must already fit in an i64
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (value > 0).then_some(value)
}

fn decimal(raw: &Value) -> Option<bigdecimal::BigDecimal> {
    match raw {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
