//! Row, value and parameter types for broker SQL queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single value returned by the broker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value (timestamps arrive as ISO-8601 strings).
    String(String),

    /// Arrays and complex objects, kept as raw JSON.
    Json(serde_json::Value),
}

impl Value {
    /// Converts a JSON cell from an array-format result.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            other => Value::Json(other),
        }
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Json(j) => j.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// A positional SQL parameter, bound to the `?` placeholders in order.
///
/// Serializes to the broker's `{"type": ..., "value": ...}` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum QueryParameter {
    Varchar(String),
    Bigint(i64),
    Double(f64),
    Boolean(bool),
    /// ISO-8601 or `yyyy-MM-dd HH:mm:ss` timestamp literal.
    Timestamp(String),
}

impl QueryParameter {
    /// Parses a CLI-style `TYPE:value` parameter, e.g. `BIGINT:42`.
    /// A value without a recognised prefix is bound as VARCHAR.
    pub fn parse(raw: &str) -> Self {
        let Some((kind, value)) = raw.split_once(':') else {
            return Self::Varchar(raw.to_string());
        };

        match kind.to_uppercase().as_str() {
            "VARCHAR" => Self::Varchar(value.to_string()),
            "BIGINT" => value
                .parse()
                .map(Self::Bigint)
                .unwrap_or_else(|_| Self::Varchar(raw.to_string())),
            "DOUBLE" => value
                .parse()
                .map(Self::Double)
                .unwrap_or_else(|_| Self::Varchar(raw.to_string())),
            "BOOLEAN" => value
                .parse()
                .map(Self::Boolean)
                .unwrap_or_else(|_| Self::Varchar(raw.to_string())),
            "TIMESTAMP" => Self::Timestamp(value.to_string()),
            _ => Self::Varchar(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from_json(json!(null)), Value::Null);
        assert_eq!(Value::from_json(json!(42)), Value::Int(42));
        assert_eq!(Value::from_json(json!(2.5)), Value::Float(2.5));
        assert_eq!(Value::from_json(json!("x")), Value::String("x".into()));
        assert_eq!(Value::from_json(json!([1, 2])), Value::Json(json!([1, 2])));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Json(json!({"a": 1})).to_display_string(), r#"{"a":1}"#);
    }

    #[test]
    fn test_parameter_wire_format() {
        let params = vec![
            QueryParameter::Varchar("wiki".into()),
            QueryParameter::Bigint(10),
        ];
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!([
                {"type": "VARCHAR", "value": "wiki"},
                {"type": "BIGINT", "value": 10}
            ])
        );
    }

    #[test]
    fn test_parameter_parse() {
        assert_eq!(QueryParameter::parse("BIGINT:42"), QueryParameter::Bigint(42));
        assert_eq!(QueryParameter::parse("boolean:true"), QueryParameter::Boolean(true));
        assert_eq!(QueryParameter::parse("plain"), QueryParameter::Varchar("plain".into()));
        assert_eq!(
            QueryParameter::parse("BIGINT:abc"),
            QueryParameter::Varchar("BIGINT:abc".into())
        );
        assert_eq!(
            QueryParameter::parse("http://x"),
            QueryParameter::Varchar("http://x".into())
        );
    }
}
