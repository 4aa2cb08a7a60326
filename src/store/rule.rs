//! Stored rule structure

use crate::error::EvalError;
use crate::record::Record;
use crate::rule::{flatten, AstNode, NodeDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule identifier, allocated by the store in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RuleId {
    fn from(id: u64) -> Self {
        RuleId(id)
    }
}

/// Named, described wrapper around one rule tree.
///
/// `is_active` and `version` belong to the storage layer; parsing,
/// evaluation and combination never read or change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub root_node: AstNode,
    pub is_active: bool,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub(crate) fn new(id: RuleId, name: String, description: String, root_node: AstNode) -> Self {
        Self {
            id,
            name,
            description,
            root_node,
            is_active: true,
            version: 1,
            created_at: Utc::now(),
        }
    }

    /// Evaluate this rule against a record
    #[inline]
    pub fn evaluate(&self, record: &Record) -> Result<bool, EvalError> {
        self.root_node.evaluate(record)
    }

    /// Canonical rule string of the stored tree
    pub fn rule_string(&self) -> String {
        self.root_node.to_string()
    }

    /// Linked-node documents for persisting the tree
    pub fn to_documents(&self) -> Vec<NodeDocument> {
        flatten(&self.root_node)
    }
}
