//! Configuration module for rule definitions and request payloads
//!
//! Rule definitions arrive either as JSON (`RuleSet::from_json`) or, with the
//! `python` feature, as Python dicts/objects.

mod definition;
mod request;

pub use definition::*;
pub use request::*;

#[cfg(feature = "python")]
pub use python::*;

#[cfg(feature = "python")]
mod python {
    use super::{RuleDefinition, RuleSet};
    use crate::record::{FieldValue, Record};
    use pyo3::exceptions::{PyKeyError, PyTypeError};
    use pyo3::prelude::*;
    use pyo3::types::{PyBool, PyDict, PyList};

    /// Helper to get optional attribute from either dict or object
    fn get_attr_opt<'py>(obj: &Bound<'py, PyAny>, name: &str) -> Option<Bound<'py, PyAny>> {
        if let Ok(dict) = obj.downcast::<PyDict>() {
            dict.get_item(name).ok().flatten()
        } else {
            obj.getattr(name).ok()
        }
    }

    /// Helper to get attribute from either dict or object
    fn get_attr<'py>(obj: &Bound<'py, PyAny>, name: &str) -> PyResult<Bound<'py, PyAny>> {
        get_attr_opt(obj, name).ok_or_else(|| PyKeyError::new_err(name.to_string()))
    }

    /// Deserialize a record from a Python dict of scalars
    pub fn deserialize_record(data: &Bound<'_, PyDict>) -> PyResult<Record> {
        let mut record = Record::with_capacity(data.len());
        for (key, value) in data.iter() {
            let field: String = key.extract()?;
            let value = extract_field_value(&field, &value)?;
            record.insert(field, value);
        }
        Ok(record)
    }

    fn extract_field_value(field: &str, value: &Bound<'_, PyAny>) -> PyResult<FieldValue> {
        // bool first: Python bools are also ints
        if value.is_instance_of::<PyBool>() {
            return Ok(FieldValue::Bool(value.extract()?));
        }
        if let Ok(n) = value.extract::<f64>() {
            return Ok(FieldValue::Number(n));
        }
        if let Ok(s) = value.extract::<String>() {
            return Ok(FieldValue::String(s));
        }
        Err(PyTypeError::new_err(format!(
            "Field '{}' must be a bool, number or str",
            field
        )))
    }

    /// Deserialize rule definitions from a list of dicts or objects with
    /// `name`, `rule_string` (or `ruleString`) and optional `description`
    pub fn deserialize_rule_set(rules: &Bound<'_, PyList>) -> PyResult<RuleSet> {
        let mut set = RuleSet::default();
        for item in rules.iter() {
            set.rules.push(extract_definition(&item)?);
        }
        Ok(set)
    }

    fn extract_definition(obj: &Bound<'_, PyAny>) -> PyResult<RuleDefinition> {
        let name: String = get_attr(obj, "name")?.extract()?;
        let description: String = get_attr_opt(obj, "description")
            .and_then(|v| v.extract().ok())
            .unwrap_or_default();
        let rule_string: String = match get_attr_opt(obj, "rule_string") {
            Some(value) => value.extract()?,
            None => get_attr(obj, "ruleString")?.extract()?,
        };

        Ok(RuleDefinition {
            name,
            description,
            rule_string,
        })
    }
}
