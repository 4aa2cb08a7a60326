//! Rule Engine Core - boolean eligibility rules as text
//!
//! Rules are written as human-readable expressions such as
//! `(age > 30 AND department = 'Sales') AND (salary > 50000)`, parsed into
//! an owned syntax tree, evaluated against field/value records and merged
//! with other rules under `OR`.
//!
//! ```
//! use rule_engine_core::record::{record_from_pairs, FieldValue};
//! use rule_engine_core::rule::{evaluate, parse_rule};
//!
//! let ast = parse_rule("age > 30 AND department = 'Sales'").unwrap();
//! let record = record_from_pairs([
//!     ("age", FieldValue::from(31)),
//!     ("department", FieldValue::from("Sales")),
//! ]);
//! assert!(evaluate(&ast, &record).unwrap());
//! ```
//!
//! Python bindings over a shared `RuleStore` are available with the
//! `python` feature.

pub mod config;
pub mod error;
pub mod record;
pub mod rule;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use error::{CombineError, EvalError, ParseError, Result, RuleEngineError};
pub use record::{FieldValue, Record};
pub use rule::{combine, evaluate, parse_rule, tokenize, AstNode};
pub use store::{Rule, RuleId, RuleStore};
