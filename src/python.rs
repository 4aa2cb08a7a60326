//! Python bindings over a process-wide rule store

use crate::config::{deserialize_record, deserialize_rule_set};
use crate::rule::check_rule as check_cached_rule;
use crate::rule::clear_cache;
use crate::store::{Rule, RuleId, RuleStore};
use once_cell::sync::Lazy;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

// ============================================================================
// Shared Store
// ============================================================================

/// Global rule store shared by every Python call
static STORE: Lazy<RuleStore> = Lazy::new(RuleStore::new);

// ============================================================================
// Helper Functions
// ============================================================================

/// Serialize a rule into a Python dict
fn rule_to_dict<'py>(py: Python<'py>, rule: &Rule) -> PyResult<Bound<'py, PyDict>> {
    let root_json = serde_json::to_string(&rule.root_node)
        .map_err(|e| PyValueError::new_err(format!("Cannot serialize rule tree: {}", e)))?;

    let dict = PyDict::new(py);
    dict.set_item("id", rule.id.0)?;
    dict.set_item("name", &rule.name)?;
    dict.set_item("description", &rule.description)?;
    dict.set_item("rule_string", rule.rule_string())?;
    dict.set_item("root_node", root_json)?;
    dict.set_item("is_active", rule.is_active)?;
    dict.set_item("version", rule.version)?;
    dict.set_item("created_at", rule.created_at.to_rfc3339())?;
    Ok(dict)
}

// ============================================================================
// Python Functions
// ============================================================================

/// Parse and store a rule, returning its id
///
/// # Raises
/// ValueError if the rule string does not parse or the name is taken
#[pyfunction]
#[pyo3(signature = (name, rule_string, description=None))]
fn create_rule(name: &str, rule_string: &str, description: Option<&str>) -> PyResult<u64> {
    let rule = STORE.create_rule(name, description.unwrap_or(""), rule_string)?;
    Ok(rule.id.0)
}

/// Store a list of rule definitions (dicts or objects with `name`,
/// `rule_string` and optional `description`); all or nothing
#[pyfunction]
fn load_rules(rules: &Bound<'_, PyList>) -> PyResult<Vec<u64>> {
    let set = deserialize_rule_set(rules)?;
    let loaded = STORE.load_rule_set(&set)?;
    Ok(loaded.iter().map(|rule| rule.id.0).collect())
}

/// List all stored rules as dicts
#[pyfunction]
fn get_rules(py: Python<'_>) -> PyResult<Bound<'_, PyList>> {
    let dicts = STORE
        .list()
        .iter()
        .map(|rule| rule_to_dict(py, rule))
        .collect::<PyResult<Vec<_>>>()?;
    PyList::new(py, dicts)
}

/// Evaluate a stored rule against a dict of field values
///
/// # Raises
/// KeyError if the rule does not exist, ValueError if a field is missing
#[pyfunction]
fn evaluate_rule(rule_id: u64, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = deserialize_record(data)?;
    Ok(STORE.evaluate(RuleId(rule_id), &record)?)
}

/// Evaluate a stored rule asynchronously
///
/// The evaluation runs on Tokio's blocking pool so the asyncio event loop
/// stays responsive for very large trees.
///
/// # Example (Python)
/// ```python
/// matched = await evaluate_async(rule_id, {"age": 31, "department": "Sales"})
/// ```
#[pyfunction]
fn evaluate_async<'py>(
    py: Python<'py>,
    rule_id: u64,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    // Convert the record while holding the GIL
    let record = deserialize_record(data)?;
    let store = STORE.clone();

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let result = tokio::task::spawn_blocking(move || store.evaluate(RuleId(rule_id), &record))
            .await
            .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;

        Ok::<bool, PyErr>(result)
    })
}

/// Evaluate a rule string directly, caching its parsed tree
#[pyfunction]
fn check_rule(rule_string: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = deserialize_record(data)?;
    Ok(check_cached_rule(rule_string, &record)?)
}

/// Drop every cached rule tree
#[pyfunction]
fn clear_rule_cache() {
    clear_cache();
}

/// OR-combine stored rules into a new rule, returning its id
///
/// # Raises
/// ValueError if fewer than two ids are given, KeyError for unknown ids
#[pyfunction]
fn combine_rules(rule_ids: Vec<u64>) -> PyResult<u64> {
    let ids: Vec<RuleId> = rule_ids.into_iter().map(RuleId).collect();
    let rule = STORE.combine(&ids)?;
    Ok(rule.id.0)
}

/// Delete a stored rule
#[pyfunction]
fn delete_rule(rule_id: u64) -> PyResult<()> {
    STORE.delete(RuleId(rule_id))?;
    Ok(())
}

/// Enable or disable a stored rule
#[pyfunction]
fn set_rule_active(rule_id: u64, active: bool) -> PyResult<()> {
    STORE.set_active(RuleId(rule_id), active)?;
    Ok(())
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(create_rule, m)?)?;
    m.add_function(wrap_pyfunction!(load_rules, m)?)?;
    m.add_function(wrap_pyfunction!(get_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_async, m)?)?;
    m.add_function(wrap_pyfunction!(check_rule, m)?)?;
    m.add_function(wrap_pyfunction!(clear_rule_cache, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(delete_rule, m)?)?;
    m.add_function(wrap_pyfunction!(set_rule_active, m)?)?;
    Ok(())
}
