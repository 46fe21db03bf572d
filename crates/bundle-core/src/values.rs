//! Raw record values and their statement literals.
//!
//! Callers hand bundles [`RawRecord`]s: maps from column name to
//! [`RawValue`]. Normalization turns every value into a [`Literal`], which
//! is what ends up embedded in (or bound to) the generated statement.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The SQL null literal.
pub const NULL_LITERAL: &str = "NULL";

/// Keyword asking the server for the column default.
pub const DEFAULT_LITERAL: &str = "DEFAULT";

/// Delimiter wrapped around quoted literals.
pub const QUOTE: char = '"';

/// A record as supplied by the caller: column name to value.
///
/// May be partial, and may be wrapped one level deep under the model name.
pub type RawRecord = HashMap<String, RawValue>;

/// A caller-supplied value before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Explicit null
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// Unsigned integer above `i64::MAX`
    Unsigned(u64),

    /// 64-bit floating point
    Float(f64),

    /// String value
    Text(String),

    /// Array of values
    List(Vec<RawValue>),

    /// Nested record (a model wrapper, or a structured column value)
    Record(RawRecord),
}

impl RawValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as a nested record.
    pub fn as_record(&self) -> Option<&RawRecord> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Textual form of the value, as it appears between the quotes of a
    /// literal. `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(true) => Some("1".to_string()),
            Self::Bool(false) => Some("0".to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Unsigned(u) => Some(u.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::List(_) | Self::Record(_) => Some(serde_json::Value::from(self).to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<u64> for RawValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::Unsigned(u),
        }
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Unsigned(u)
                } else {
                    match n.as_f64() {
                        Some(f) => Self::Float(f),
                        None => Self::Text(n.to_string()),
                    }
                }
            }
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Record(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&RawValue> for serde_json::Value {
    fn from(value: &RawValue) -> Self {
        use serde_json::Value;
        match value {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Integer(i) => Value::from(*i),
            RawValue::Unsigned(u) => Value::from(*u),
            RawValue::Float(f) => Value::from(*f),
            RawValue::Text(s) => Value::String(s.clone()),
            RawValue::List(items) => Value::Array(items.iter().map(Value::from).collect()),
            RawValue::Record(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A value rendered for statement generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `NULL`, unquoted
    Null,

    /// `DEFAULT`, unquoted; fills a column a record does not carry
    Default,

    /// Textual form, embedded between [`QUOTE`] delimiters
    Quoted(String),
}

impl Literal {
    /// Render a raw value.
    ///
    /// A text value spelled exactly `NULL` renders as the null literal.
    pub fn from_raw(value: &RawValue) -> Self {
        match value.to_text() {
            None => Self::Null,
            Some(text) if text == NULL_LITERAL => Self::Null,
            Some(text) => Self::Quoted(text),
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self::Quoted(text.into())
    }

    /// The value a placeholder would be bound to; `None` for NULL.
    ///
    /// Returns `None` for [`Literal::Default`] too; callers inline `DEFAULT`
    /// instead of binding it.
    pub fn bind_value(&self) -> Option<&str> {
        match self {
            Self::Quoted(text) => Some(text),
            Self::Null | Self::Default => None,
        }
    }
}

impl fmt::Display for Literal {
    /// Legacy rendering. Quote characters inside the text are NOT escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_LITERAL),
            Self::Default => f.write_str(DEFAULT_LITERAL),
            Self::Quoted(text) => write!(f, "{QUOTE}{text}{QUOTE}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        let value = RawValue::from(json!({
            "name": "Alice",
            "age": 30,
            "ratio": 0.5,
            "active": true,
            "nick": null,
            "tags": ["a", "b"]
        }));
        let record = value.as_record().unwrap();
        assert_eq!(record["name"], RawValue::Text("Alice".into()));
        assert_eq!(record["age"], RawValue::Integer(30));
        assert_eq!(record["ratio"], RawValue::Float(0.5));
        assert_eq!(record["active"], RawValue::Bool(true));
        assert!(record["nick"].is_null());
        assert_eq!(record["tags"].to_text().unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_untagged_deserialize() {
        let record: RawRecord = serde_json::from_str(r#"{"a": 1, "b": "x", "c": null}"#).unwrap();
        assert_eq!(record["a"], RawValue::Integer(1));
        assert_eq!(record["b"], RawValue::Text("x".into()));
        assert_eq!(record["c"], RawValue::Null);
    }

    #[test]
    fn test_large_unsigned_keeps_every_digit() {
        let record: RawRecord =
            serde_json::from_str(r#"{"id": 18446744073709551615, "small": 7}"#).unwrap();
        assert_eq!(record["id"], RawValue::Unsigned(u64::MAX));
        assert_eq!(record["small"], RawValue::Integer(7));
        assert_eq!(
            Literal::from_raw(&record["id"]).to_string(),
            "\"18446744073709551615\""
        );

        let value = RawValue::from(json!({"id": 9223372036854775808u64}));
        let id = &value.as_record().unwrap()["id"];
        assert_eq!(id.to_text().as_deref(), Some("9223372036854775808"));
        assert_eq!(RawValue::from(5u64), RawValue::Integer(5));
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Literal::from_raw(&RawValue::Null).to_string(), "NULL");
        assert_eq!(Literal::from_raw(&"NULL".into()).to_string(), "NULL");
        assert_eq!(Literal::from_raw(&"Alice".into()).to_string(), "\"Alice\"");
        assert_eq!(Literal::from_raw(&RawValue::Integer(0)).to_string(), "\"0\"");
        assert_eq!(Literal::from_raw(&RawValue::Bool(false)).to_string(), "\"0\"");
        assert_eq!(Literal::Default.to_string(), "DEFAULT");
    }

    #[test]
    fn test_embedded_quote_is_not_escaped() {
        let literal = Literal::from_raw(&r#"say "hi""#.into());
        assert_eq!(literal.to_string(), r#""say "hi"""#);
        assert_eq!(literal.bind_value(), Some(r#"say "hi""#));
    }
}
