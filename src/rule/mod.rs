//! Rule language: tokenizing, parsing, evaluating and combining
//!
//! This module handles rule strings like
//! "(age > 30 AND department = 'Sales') AND (salary > 50000)"
//! and evaluates them against records.

mod ast;
pub mod cache;
mod combiner;
pub mod document;
mod evaluator;
pub mod parser;
pub mod token;


pub use ast::*;
pub use cache::*;
pub use combiner::*;
pub use document::*;
pub use evaluator::*;
pub use parser::*;
pub use token::*;
