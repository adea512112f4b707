//! Values crossing the boundary between tool parameters and SQL drivers

use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::str::FromStr;

/// Column or parameter type as the dispatcher sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Text,
    Decimal,
    Timestamp,
}

/// A bound parameter or a decoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Decimal(BigDecimal),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render for a row record.
    ///
    /// Decimals become JSON numbers and timestamps RFC 3339 strings in UTC.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Null => Value::Null,
            SqlValue::Int(v) => Value::from(*v),
            SqlValue::Decimal(v) => decimal_to_json(v),
            SqlValue::Text(v) => Value::String(v.clone()),
            SqlValue::Timestamp(v) => {
                Value::String(v.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

fn decimal_to_json(value: &BigDecimal) -> Value {
    let text = value.normalized().to_string();
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

/// Parse a decimal from its textual form, as JSON numbers print it.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Lossy conversion for drivers without native decimal support.
///
/// `None` when the value does not fit in a finite `f64`.
pub fn decimal_to_f64(value: &BigDecimal) -> Option<f64> {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decimal_renders_as_number() {
        let price = parse_decimal("9.9900").unwrap();
        assert_eq!(SqlValue::Decimal(price).to_json(), serde_json::json!(9.99));
    }

    #[test]
    fn test_timestamp_renders_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(
            SqlValue::Timestamp(ts).to_json(),
            serde_json::json!("2025-03-01T08:30:00Z")
        );
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("12.5").is_some());
        assert!(parse_decimal("twelve").is_none());
    }

    #[test]
    fn test_decimal_to_f64_rejects_overflow() {
        assert_eq!(decimal_to_f64(&parse_decimal("14.99").unwrap()), Some(14.99));
        assert_eq!(decimal_to_f64(&parse_decimal("1e400").unwrap()), None);
        assert_eq!(decimal_to_f64(&parse_decimal("-1e400").unwrap()), None);
    }
}
