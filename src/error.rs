//! Error types for the rule engine

#[cfg(feature = "python")]
use pyo3::exceptions::{PyKeyError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

/// Failure to turn a rule string into an AST
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Rule string is empty or contains no valid tokens")]
    EmptyOrInvalid,

    #[error("Missing closing parenthesis")]
    MissingClosingParen,

    #[error("Unexpected end of rule string")]
    UnexpectedEnd,

    #[error("Malformed comparison: {0}")]
    MalformedComparison(String),

    #[error("Rule nests deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Failure while evaluating an AST against a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Field not found in record: {0}")]
    MissingField(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),
}

/// Failure while merging rule trees
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CombineError {
    #[error("At least two rules are required for combination, got {found}")]
    InsufficientRules { found: usize },

    #[error("Combined rule would be {depth} levels deep, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
}

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleEngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Combine error: {0}")]
    Combine(#[from] CombineError),

    #[error("Rule not found: {0}")]
    RuleNotFound(u64),

    #[error("Rule name already exists: {0}")]
    DuplicateName(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for RuleEngineError {
    fn from(err: serde_json::Error) -> Self {
        RuleEngineError::Deserialization(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<RuleEngineError> for PyErr {
    fn from(err: RuleEngineError) -> PyErr {
        match err {
            RuleEngineError::RuleNotFound(id) => {
                PyKeyError::new_err(format!("Rule not found: {}", id))
            }
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleEngineError>;
