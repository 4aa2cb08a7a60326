//! Request payloads a surrounding service hands to the store

use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Evaluate one stored rule against a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub rule_id: u64,
    pub data: Record,
}

/// Combine stored rules into a new rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineRequest {
    pub rule_ids: Vec<u64>,
}
