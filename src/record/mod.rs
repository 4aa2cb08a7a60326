//! Evaluation input records
//!
//! A record maps field names to scalar values. It is supplied fresh for
//! every evaluation and never modified by the engine.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field name to value mapping a rule is evaluated against
pub type Record = HashMap<String, FieldValue>;

/// Scalar value held by a record field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
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

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

/// Parse a record from a JSON object of scalar values
pub fn record_from_json(json: &str) -> Result<Record> {
    Ok(serde_json::from_str(json)?)
}

/// Build a record from `(field, value)` pairs
pub fn record_from_pairs<I, K, V>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_json() {
        let record =
            record_from_json(r#"{"age": 31, "department": "Sales", "manager": false}"#).unwrap();
        assert_eq!(record["age"], FieldValue::Number(31.0));
        assert_eq!(record["department"], FieldValue::String("Sales".to_string()));
        assert_eq!(record["manager"], FieldValue::Bool(false));
    }

    #[test]
    fn test_record_from_json_rejects_nested_values() {
        assert!(record_from_json(r#"{"address": {"city": "Paris"}}"#).is_err());
        assert!(record_from_json(r#"{"age": null}"#).is_err());
        assert!(record_from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_record_from_pairs() {
        let record = record_from_pairs([("age", FieldValue::from(30)), ("name", "Ann".into())]);
        assert_eq!(record.len(), 2);
        assert_eq!(record["age"], FieldValue::Number(30.0));
        assert_eq!(record["name"], FieldValue::String("Ann".to_string()));
    }
}
