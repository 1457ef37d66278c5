//! Scalar values of query results

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::MigrationError;

/// A scalar cell of a query result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum QueryValue {
    /// Missing value
    Null,
    /// Text
    String(String),
    /// Boolean
    Bool(bool),
    /// Single precision float
    F32(f32),
    /// Double precision float
    F64(f64),
    /// Integer
    Int(i64),
    /// Number kept in its decimal text form
    Number(String),
}

impl QueryValue {
    /// Check if the value is missing
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }

    /// Coerce the value to a float
    ///
    /// Strings and decimal numbers are parsed, booleans become 1 or 0.
    pub fn to_f64(&self) -> Result<f64, MigrationError> {
        match self {
            QueryValue::F64(v) => Ok(*v),
            QueryValue::F32(v) => Ok(f64::from(*v)),
            QueryValue::Int(v) => Ok(*v as f64),
            QueryValue::Bool(true) => Ok(1.0),
            QueryValue::Bool(false) => Ok(0.0),
            QueryValue::String(s) | QueryValue::Number(s) => {
                s.parse::<f64>().map_err(|_| self.conversion_error())
            },
            QueryValue::Null => Err(self.conversion_error()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryValue::Null => "null",
            QueryValue::String(_) => "string",
            QueryValue::Bool(_) => "bool",
            QueryValue::F32(_) => "float32",
            QueryValue::F64(_) => "float64",
            QueryValue::Int(_) => "int",
            QueryValue::Number(_) => "number",
        }
    }

    fn conversion_error(&self) -> MigrationError {
        MigrationError::TypeConversion {
            value: self.to_string(),
            kind: self.kind(),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => f.write_str("null"),
            QueryValue::String(s) | QueryValue::Number(s) => f.write_str(s),
            QueryValue::Bool(v) => write!(f, "{v}"),
            QueryValue::F32(v) => write!(f, "{v}"),
            QueryValue::F64(v) => write!(f, "{v}"),
            QueryValue::Int(v) => write!(f, "{v}"),
        }
    }
}

impl From<Value> for QueryValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => QueryValue::Null,
            Value::Bool(b) => QueryValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => QueryValue::Int(i),
                (None, Some(f)) if n.is_f64() => QueryValue::F64(f),
                // Integers beyond i64 keep their exact decimal form
                _ => QueryValue::Number(n.to_string()),
            },
            Value::String(s) => QueryValue::String(s),
            other => QueryValue::String(other.to_string()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::String(s.to_string())
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::F64(v)
    }
}

impl From<f32> for QueryValue {
    fn from(v: f32) -> Self {
        QueryValue::F32(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(QueryValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64_success() {
        let cases: Vec<(QueryValue, f64)> = vec![
            ("123.4".into(), 123.4),
            (123.4f64.into(), 123.4),
            (12f32.into(), 12.0),
            (123i64.into(), 123.0),
            (true.into(), 1.0),
            (false.into(), 0.0),
            (QueryValue::Number("123456.789".to_string()), 123456.789),
        ];
        for (value, expected) in cases {
            assert_eq!(value.to_f64().unwrap(), expected, "converting {value:?}");
        }
    }

    #[test]
    fn test_to_f64_failure() {
        let err = QueryValue::from("text").to_f64().unwrap_err();
        assert_eq!(
            err,
            MigrationError::TypeConversion {
                value: "text".to_string(),
                kind: "string",
            }
        );
        assert!(QueryValue::Null.to_f64().is_err());
    }

    #[test]
    fn test_from_json() {
        let values: Vec<QueryValue> =
            serde_json::from_str(r#"[null, "10", 3, 1.5, true, 18446744073709551615]"#).unwrap();
        assert_eq!(
            values,
            vec![
                QueryValue::Null,
                QueryValue::String("10".to_string()),
                QueryValue::Int(3),
                QueryValue::F64(1.5),
                QueryValue::Bool(true),
                QueryValue::Number("18446744073709551615".to_string()),
            ]
        );
        assert_eq!(values[5].to_f64().unwrap(), 18446744073709551615.0);
    }
}
