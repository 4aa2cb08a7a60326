//! Rule evaluator

use crate::error::EvalError;
use crate::record::{FieldValue, Record};
use crate::rule::ast::{AstNode, Comparison, ComparisonOp, Literal, LogicalOp};
use std::cmp::Ordering;

/// Evaluate an AST against a record.
///
/// Both children of an operator node are always evaluated before the
/// results are combined; there is no short-circuiting.
pub fn evaluate(ast: &AstNode, record: &Record) -> Result<bool, EvalError> {
    match ast {
        AstNode::Operand(cmp) => evaluate_comparison(cmp, record),
        AstNode::Operator {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            Ok(match operator {
                LogicalOp::And => left && right,
                LogicalOp::Or => left || right,
            })
        }
    }
}

impl AstNode {
    /// Evaluate this tree against a record
    #[inline]
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        evaluate(self, record)
    }
}

fn evaluate_comparison(cmp: &Comparison, record: &Record) -> Result<bool, EvalError> {
    let field_value = record
        .get(&cmp.field)
        .ok_or_else(|| EvalError::MissingField(cmp.field.clone()))?;

    let result = match &cmp.operator {
        ComparisonOp::Equal => strict_equals(field_value, &cmp.value),
        ComparisonOp::NotEqual => !strict_equals(field_value, &cmp.value),
        ComparisonOp::Greater => ordering(field_value, &cmp.value) == Some(Ordering::Greater),
        ComparisonOp::Less => ordering(field_value, &cmp.value) == Some(Ordering::Less),
        ComparisonOp::GreaterEqual => matches!(
            ordering(field_value, &cmp.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ComparisonOp::LessEqual => matches!(
            ordering(field_value, &cmp.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ComparisonOp::Unrecognized(symbol) => {
            return Err(EvalError::UnknownOperator(symbol.clone()))
        }
    };

    Ok(result)
}

/// Type-and-value equality: values of different types are never equal
fn strict_equals(field_value: &FieldValue, literal: &Literal) -> bool {
    match (field_value, literal) {
        (FieldValue::Number(a), Literal::Number(b)) => a == b,
        (FieldValue::String(a), Literal::String(b)) => a == b,
        _ => false,
    }
}

/// Ordering of a field value relative to a literal.
/// `None` when the types differ or a number is NaN; every ordering
/// comparison is then false.
fn ordering(field_value: &FieldValue, literal: &Literal) -> Option<Ordering> {
    match (field_value, literal) {
        (FieldValue::Number(a), Literal::Number(b)) => a.partial_cmp(b),
        (FieldValue::String(a), Literal::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}
