//! Rule storage module
//!
//! Keeps named rules in memory, enforces unique names and runs evaluation
//! and combination by rule id.

mod registry;
mod rule;

pub use registry::*;
pub use rule::*;
