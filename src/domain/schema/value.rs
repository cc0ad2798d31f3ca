//! Typed field values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A validated, typed value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    /// Decimal, currency and percent values.
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    /// One of a select field's options.
    Choice(String),
    /// Name of an existing record.
    Reference(String),
}

impl FieldValue {
    /// JSON representation handed to the document store.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::Choice(s) | Self::Reference(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Choice(s) | Self::Reference(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Number(n) => write!(f, "{}", n),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Boolean(true) => write!(f, "Yes"),
            Self::Boolean(false) => write!(f, "No"),
        }
    }
}

/// One row of a repeating subgroup, keyed by row field name.
pub type RowData = BTreeMap<String, FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_json_maps_each_variant() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(FieldValue::Text("x".into()).to_json(), json!("x"));
        assert_eq!(FieldValue::Integer(4).to_json(), json!(4));
        assert_eq!(FieldValue::Number(2.5).to_json(), json!(2.5));
        assert_eq!(FieldValue::Date(date).to_json(), json!("2025-03-09"));
        assert_eq!(FieldValue::Boolean(true).to_json(), json!(true));
        assert_eq!(FieldValue::Reference("Acme".into()).to_json(), json!("Acme"));
    }

    #[test]
    fn display_renders_booleans_as_yes_no() {
        assert_eq!(FieldValue::Boolean(false).to_string(), "No");
    }

    #[test]
    fn serde_keeps_variant_tag() {
        let v = FieldValue::Choice("Beta".into());
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"kind":"choice","value":"Beta"}"#);
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
