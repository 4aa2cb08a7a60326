//! Abstract Syntax Tree for rule expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest tree, and deepest parenthesis nesting, a rule may have.
/// Every walk over a tree recurses once per level.
pub const MAX_DEPTH: usize = 512;

/// AST node for rule expressions
///
/// Operator nodes own both children outright, so a tree can be cloned,
/// shared read-only across threads, or dropped without affecting any other
/// tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    /// Logical combination of two subtrees
    Operator {
        operator: LogicalOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Single comparison like "age > 30"
    Operand(Comparison),
}

/// Single field comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: String,
    pub operator: ComparisonOp,
    pub value: Literal,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Comparison operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ComparisonOp {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Equal (=)
    Equal,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Not equal (!=)
    NotEqual,
    /// Operator-like symbol outside the six above, rejected on evaluation
    Unrecognized(String),
}

/// Literal value on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl AstNode {
    /// Build an operand (leaf) node
    pub fn operand(field: impl Into<String>, operator: ComparisonOp, value: Literal) -> Self {
        AstNode::Operand(Comparison {
            field: field.into(),
            operator,
            value,
        })
    }

    /// Build an operator node owning both children
    pub fn operator(operator: LogicalOp, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of nodes in this tree
    pub fn node_count(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Depth of this tree; a single operand has depth 1
    pub fn depth(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl LogicalOp {
    /// Keyword as written in rule strings
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    /// Parse a keyword; matching is case-sensitive
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

impl ComparisonOp {
    /// Map an operator symbol onto a comparison operator.
    /// Never fails: unknown symbols are kept as `Unrecognized`.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            ">" => ComparisonOp::Greater,
            "<" => ComparisonOp::Less,
            "=" => ComparisonOp::Equal,
            ">=" => ComparisonOp::GreaterEqual,
            "<=" => ComparisonOp::LessEqual,
            "!=" => ComparisonOp::NotEqual,
            other => ComparisonOp::Unrecognized(other.to_string()),
        }
    }

    /// Symbol as written in rule strings
    pub fn symbol(&self) -> &str {
        match self {
            ComparisonOp::Greater => ">",
            ComparisonOp::Less => "<",
            ComparisonOp::Equal => "=",
            ComparisonOp::GreaterEqual => ">=",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Unrecognized(symbol) => symbol,
        }
    }
}

impl From<String> for ComparisonOp {
    fn from(symbol: String) -> Self {
        ComparisonOp::from_symbol(&symbol)
    }
}

impl From<ComparisonOp> for String {
    fn from(op: ComparisonOp) -> Self {
        op.symbol().to_string()
    }
}

impl Literal {
    /// Literal for a value written in a rule. Text that reads as a finite
    /// number becomes a number, quoted or not; anything else stays a string.
    pub fn coerce(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Literal::Number(n),
            _ => Literal::String(text.to_string()),
        }
    }

    /// Whether the canonical text form reads back as this same literal.
    /// Numeric-looking strings read back as numbers, and there is no
    /// escape for `'` inside a quoted string.
    pub fn round_trips(&self) -> bool {
        match self {
            Literal::Number(n) => n.is_finite(),
            Literal::String(s) => !s.contains('\'') && Literal::coerce(s) == *self,
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

// ============================================================================
// Canonical text form
// ============================================================================

impl fmt::Display for AstNode {
    /// Fully parenthesized rule string. It parses back to an equivalent tree
    /// when every field is a plain word and every literal `round_trips`,
    /// which holds for any tree produced by `parse_rule` or `rehydrate`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Operand(cmp) => write!(f, "{}", cmp),
            AstNode::Operator {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator.keyword(), right),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator.symbol(), self.value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}
