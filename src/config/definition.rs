//! Rule definition structures

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Human-authored rule as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Rule expression, e.g. "age > 30 AND department = 'Sales'"
    #[serde(rename = "ruleString", alias = "rule_string")]
    pub rule_string: String,
}

impl RuleDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rule_string: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rule_string: rule_string.into(),
        }
    }
}

/// Batch of rule definitions: {"rules": [RuleDefinition, ...]}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSet {
    /// Parse a rule set from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
