//! Linked-node document form of a rule tree
//!
//! A document store persists a tree as a flat list of nodes that refer to
//! their children by position. `flatten` produces that list and `rehydrate`
//! resolves it back into a fully owned `AstNode` before evaluation.

use crate::error::EvalError;
use crate::record::Record;
use crate::rule::ast::{AstNode, ComparisonOp, Literal, LogicalOp, MAX_DEPTH};
use crate::rule::evaluator::evaluate;
use crate::rule::token::{is_field_name, is_operator_symbol};
use serde::{Deserialize, Serialize};

/// Type tag of operator documents
pub const OPERATOR_TYPE: &str = "operator";
/// Type tag of operand documents
pub const OPERAND_TYPE: &str = "operand";

/// One persisted tree node; `left`/`right` are positions in the node list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,
}

/// Flatten a tree into pre-order node documents; the root is at index 0
pub fn flatten(ast: &AstNode) -> Vec<NodeDocument> {
    let mut nodes = Vec::with_capacity(ast.node_count());
    push_node(ast, &mut nodes);
    nodes
}

fn push_node(ast: &AstNode, nodes: &mut Vec<NodeDocument>) -> usize {
    let index = nodes.len();
    match ast {
        AstNode::Operand(cmp) => nodes.push(NodeDocument {
            node_type: Some(OPERAND_TYPE.to_string()),
            operator: Some(cmp.operator.symbol().to_string()),
            field: Some(cmp.field.clone()),
            value: Some(cmp.value.clone()),
            left: None,
            right: None,
        }),
        AstNode::Operator {
            operator,
            left,
            right,
        } => {
            nodes.push(NodeDocument {
                node_type: Some(OPERATOR_TYPE.to_string()),
                operator: Some(operator.keyword().to_string()),
                ..Default::default()
            });
            let left = push_node(left, nodes);
            let right = push_node(right, nodes);
            nodes[index].left = Some(left);
            nodes[index].right = Some(right);
        }
    }
    index
}

/// Resolve node documents into a complete tree rooted at `root`.
///
/// Fails rather than returning a partial tree: every descendant must exist,
/// be referenced exactly once and have a shape consistent with its type.
/// Operands must also be writable as rule text, and the tree may be at
/// most `MAX_DEPTH` levels deep.
pub fn rehydrate(nodes: &[NodeDocument], root: usize) -> Result<AstNode, EvalError> {
    let mut visited = vec![false; nodes.len()];
    build(nodes, root, 1, &mut visited)
}

/// Rehydrate and evaluate in one step
pub fn evaluate_documents(
    nodes: &[NodeDocument],
    root: usize,
    record: &Record,
) -> Result<bool, EvalError> {
    let ast = rehydrate(nodes, root)?;
    evaluate(&ast, record)
}

fn build(
    nodes: &[NodeDocument],
    index: usize,
    depth: usize,
    visited: &mut [bool],
) -> Result<AstNode, EvalError> {
    let doc = nodes
        .get(index)
        .ok_or_else(|| EvalError::InvalidNode(format!("node {} does not exist", index)))?;

    if depth > MAX_DEPTH {
        return Err(EvalError::InvalidNode(format!(
            "node {} lies deeper than {} levels",
            index, MAX_DEPTH
        )));
    }

    if std::mem::replace(&mut visited[index], true) {
        return Err(EvalError::InvalidNode(format!(
            "node {} is referenced more than once",
            index
        )));
    }

    match doc.node_type.as_deref() {
        Some(OPERATOR_TYPE) => {
            if doc.field.is_some() || doc.value.is_some() {
                return Err(EvalError::InvalidNode(format!(
                    "operator node {} carries a field or value",
                    index
                )));
            }
            let keyword = doc.operator.as_deref().ok_or_else(|| {
                EvalError::InvalidNode(format!("operator node {} has no operator", index))
            })?;
            let operator = LogicalOp::from_keyword(keyword)
                .ok_or_else(|| EvalError::UnknownOperator(keyword.to_string()))?;
            let (left, right) = match (doc.left, doc.right) {
                (Some(left), Some(right)) => (left, right),
                _ => {
                    return Err(EvalError::InvalidNode(format!(
                        "operator node {} needs two children",
                        index
                    )))
                }
            };

            let left = build(nodes, left, depth + 1, visited)?;
            let right = build(nodes, right, depth + 1, visited)?;
            Ok(AstNode::operator(operator, left, right))
        }
        Some(OPERAND_TYPE) => {
            if doc.left.is_some() || doc.right.is_some() {
                return Err(EvalError::InvalidNode(format!(
                    "operand node {} has children",
                    index
                )));
            }
            let (field, symbol, value) = match (&doc.field, &doc.operator, &doc.value) {
                (Some(field), Some(symbol), Some(value)) => (field, symbol, value),
                _ => {
                    return Err(EvalError::InvalidNode(format!(
                        "operand node {} needs a field, operator and value",
                        index
                    )))
                }
            };
            if !is_field_name(field) {
                return Err(EvalError::InvalidNode(format!(
                    "operand node {} has unusable field name '{}'",
                    index, field
                )));
            }
            if !is_operator_symbol(symbol) {
                return Err(EvalError::InvalidNode(format!(
                    "operand node {} has unusable operator '{}'",
                    index, symbol
                )));
            }
            if !value.round_trips() {
                return Err(EvalError::InvalidNode(format!(
                    "operand node {} has a value rule text cannot express: {:?}",
                    index, value
                )));
            }

            Ok(AstNode::operand(
                field.clone(),
                ComparisonOp::from_symbol(symbol),
                value.clone(),
            ))
        }
        Some(other) => Err(EvalError::InvalidNode(format!(
            "node {} has unknown type '{}'",
            index, other
        ))),
        None => Err(EvalError::InvalidNode(format!("node {} has no type", index))),
    }
}
