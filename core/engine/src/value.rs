//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Defines the scalar value held by a single record field.
//! CONTEXT: Uploaded rows are stored as JSON documents, so every field is one
//! of the JSON scalars. Arrays and objects are rejected at the boundary.

use serde::{Deserialize, Serialize};

/// The value of one field inside a record.
/// Serialized as the bare JSON scalar (`null`, `true`, `12.5`, `"text"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the value as a group-key string, or None for null.
    /// Whole numbers print without decimals so that `10` and `10.0`
    /// land in the same group.
    pub fn display_value(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Boolean(b) => Some(if *b { "true" } else { "false" }.to_string()),
        }
    }

    /// Numeric coercion used by aggregation.
    /// Text is accepted when it parses as a finite number after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Null => None,
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Number(_) => None,
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Formats a number without unnecessary decimal places.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(FieldValue::Number(10.0).display_value(), Some("10".to_string()));
        assert_eq!(FieldValue::Number(2.5).display_value(), Some("2.5".to_string()));
        assert_eq!(FieldValue::text("North").display_value(), Some("North".to_string()));
        assert_eq!(FieldValue::Boolean(true).display_value(), Some("true".to_string()));
        assert_eq!(FieldValue::Null.display_value(), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(FieldValue::Number(3.0).as_number(), Some(3.0));
        assert_eq!(FieldValue::text(" 42.5 ").as_number(), Some(42.5));
        assert_eq!(FieldValue::text("abc").as_number(), None);
        assert_eq!(FieldValue::text("NaN").as_number(), None);
        assert_eq!(FieldValue::Boolean(false).as_number(), Some(0.0));
        assert_eq!(FieldValue::Null.as_number(), None);
    }

    #[test]
    fn test_json_scalars() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"[null, true, 7, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Boolean(true),
                FieldValue::Number(7.0),
                FieldValue::text("x"),
            ]
        );

        assert!(serde_json::from_str::<FieldValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FieldValue>(r#"{"a": 1}"#).is_err());
    }
}
