//! In-memory rule store

use crate::config::{CombineRequest, EvaluateRequest, RuleDefinition, RuleSet};
use crate::error::{Result, RuleEngineError};
use crate::record::Record;
use crate::rule::{combine, parse_rule, AstNode};
use crate::store::rule::{Rule, RuleId};
use ahash::{AHashMap, AHashSet};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Description given to rules produced by `combine`
pub const COMBINED_RULE_DESCRIPTION: &str = "Automatically combined rule";

#[derive(Debug, Default)]
struct StoreInner {
    rules: BTreeMap<RuleId, Arc<Rule>>,
    names: AHashMap<String, RuleId>,
    next_id: u64,
}

impl StoreInner {
    fn allocate_id(&mut self) -> RuleId {
        self.next_id += 1;
        RuleId(self.next_id)
    }

    fn insert(&mut self, name: String, description: String, root: AstNode) -> Arc<Rule> {
        let id = self.allocate_id();
        let rule = Arc::new(Rule::new(id, name.clone(), description, root));
        self.names.insert(name, id);
        self.rules.insert(id, rule.clone());
        rule
    }

    /// `base` if no rule has it, otherwise `base-<n>` with the first free
    /// `n` counting up from the next id
    fn unique_name(&self, base: String) -> String {
        if !self.names.contains_key(&base) {
            return base;
        }
        let mut suffix = self.next_id + 1;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn resolve(&self, id: RuleId) -> Result<Arc<Rule>> {
        self.rules
            .get(&id)
            .cloned()
            .ok_or(RuleEngineError::RuleNotFound(id.0))
    }
}

/// Thread-safe rule store.
///
/// Rules are handed out as `Arc<Rule>`; evaluation runs on the shared tree
/// without holding the store lock. Cloning the store shares its contents.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rules
    pub fn len(&self) -> usize {
        self.inner.read().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rules.is_empty()
    }

    /// Parse a rule string and store it under a unique name
    #[instrument(skip(self, description))]
    pub fn create_rule(&self, name: &str, description: &str, rule_string: &str) -> Result<Arc<Rule>> {
        let root = parse_rule(rule_string)?;

        let mut inner = self.inner.write();
        if inner.names.contains_key(name) {
            warn!("Rule name already exists: {}", name);
            return Err(RuleEngineError::DuplicateName(name.to_string()));
        }
        let rule = inner.insert(name.to_string(), description.to_string(), root);

        info!(rule_id = %rule.id, "Rule created");
        Ok(rule)
    }

    /// Store a rule from its definition
    pub fn create_from_definition(&self, definition: &RuleDefinition) -> Result<Arc<Rule>> {
        self.create_rule(
            &definition.name,
            &definition.description,
            &definition.rule_string,
        )
    }

    /// Store every rule of a set, or none of them if any fails to parse or
    /// clashes with an existing name
    #[instrument(skip(self, set), fields(count = set.len()))]
    pub fn load_rule_set(&self, set: &RuleSet) -> Result<Vec<Arc<Rule>>> {
        let mut parsed = Vec::with_capacity(set.len());
        let mut seen = AHashSet::with_capacity(set.len());
        for definition in &set.rules {
            if !seen.insert(definition.name.as_str()) {
                return Err(RuleEngineError::DuplicateName(definition.name.clone()));
            }
            parsed.push((definition, parse_rule(&definition.rule_string)?));
        }

        let mut inner = self.inner.write();
        if let Some(taken) = set.rules.iter().find(|d| inner.names.contains_key(&d.name)) {
            warn!("Rule name already exists: {}", taken.name);
            return Err(RuleEngineError::DuplicateName(taken.name.clone()));
        }

        let rules: Vec<Arc<Rule>> = parsed
            .into_iter()
            .map(|(definition, root)| {
                inner.insert(
                    definition.name.clone(),
                    definition.description.clone(),
                    root,
                )
            })
            .collect();

        info!("Loaded {} rules", rules.len());
        Ok(rules)
    }

    /// Get a rule by id
    pub fn get(&self, id: RuleId) -> Option<Arc<Rule>> {
        self.inner.read().rules.get(&id).cloned()
    }

    /// Get a rule by its unique name
    pub fn get_by_name(&self, name: &str) -> Option<Arc<Rule>> {
        let inner = self.inner.read();
        inner
            .names
            .get(name)
            .and_then(|id| inner.rules.get(id))
            .cloned()
    }

    /// All rules ordered by id
    pub fn list(&self) -> Vec<Arc<Rule>> {
        self.inner.read().rules.values().cloned().collect()
    }

    /// Remove a rule; trees combined from it earlier are unaffected
    #[instrument(skip(self))]
    pub fn delete(&self, id: RuleId) -> Result<Arc<Rule>> {
        let mut inner = self.inner.write();
        match inner.rules.remove(&id) {
            Some(rule) => {
                inner.names.remove(&rule.name);
                info!("Rule deleted: {}", id);
                Ok(rule)
            }
            None => {
                warn!("Deleting missing rule: {}", id);
                Err(RuleEngineError::RuleNotFound(id.0))
            }
        }
    }

    /// Toggle the activity flag of a stored rule
    pub fn set_active(&self, id: RuleId, active: bool) -> Result<Arc<Rule>> {
        let mut inner = self.inner.write();
        let current = inner.resolve(id)?;
        let updated = Arc::new(Rule {
            is_active: active,
            ..(*current).clone()
        });
        inner.rules.insert(id, updated.clone());
        Ok(updated)
    }

    /// Evaluate a stored rule against a record
    pub fn evaluate(&self, id: RuleId, record: &Record) -> Result<bool> {
        let rule = self.inner.read().resolve(id)?;
        Ok(rule.evaluate(record)?)
    }

    pub fn evaluate_request(&self, request: &EvaluateRequest) -> Result<bool> {
        self.evaluate(RuleId(request.rule_id), &request.data)
    }

    /// OR-combine stored rules, in the given order, into a new stored rule
    #[instrument(skip(self))]
    pub fn combine(&self, ids: &[RuleId]) -> Result<Arc<Rule>> {
        let sources = {
            let inner = self.inner.read();
            ids.iter()
                .map(|id| inner.resolve(*id))
                .collect::<Result<Vec<_>>>()?
        };

        let root = combine(sources.iter().map(|rule| &rule.root_node))?;

        let mut inner = self.inner.write();
        let base = format!("Combined Rule {}", Utc::now().timestamp_millis());
        let name = inner.unique_name(base);
        let rule = inner.insert(name, COMBINED_RULE_DESCRIPTION.to_string(), root);

        info!(rule_id = %rule.id, sources = ids.len(), "Rules combined");
        Ok(rule)
    }

    pub fn combine_request(&self, request: &CombineRequest) -> Result<Arc<Rule>> {
        let ids: Vec<RuleId> = request.rule_ids.iter().copied().map(RuleId).collect();
        self.combine(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CombineError, EvalError, ParseError};
    use crate::record::record_from_pairs;

    fn employee(age: i32, department: &str, salary: i32) -> Record {
        record_from_pairs([
            ("age", crate::record::FieldValue::from(age)),
            ("department", department.into()),
            ("salary", salary.into()),
        ])
    }

    #[test]
    fn test_create_and_evaluate() {
        let store = RuleStore::new();
        let rule = store
            .create_rule(
                "senior_sales",
                "Senior sales staff",
                "(age > 30 AND department = 'Sales') AND (salary > 50000)",
            )
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.evaluate(rule.id, &employee(31, "Sales", 60000)).unwrap());
        assert!(!store.evaluate(rule.id, &employee(29, "Sales", 60000)).unwrap());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let store = RuleStore::new();
        store.create_rule("r", "", "age > 1").unwrap();
        let err = store.create_rule("r", "", "age > 2").unwrap_err();
        assert!(matches!(err, RuleEngineError::DuplicateName(name) if name == "r"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_parse_failure_stores_nothing() {
        let store = RuleStore::new();
        let err = store.create_rule("broken", "", "(age > 30 AND").unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Parse(ParseError::UnexpectedEnd)
        ));
        assert!(store.is_empty());
        assert!(store.get_by_name("broken").is_none());
    }

    #[test]
    fn test_ids_increase() {
        let store = RuleStore::new();
        let a = store.create_rule("a", "", "x > 1").unwrap();
        let b = store.create_rule("b", "", "x > 2").unwrap();
        assert!(b.id > a.id);

        let listed: Vec<RuleId> = store.list().iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![a.id, b.id]);
    }

    #[test]
    fn test_combine_three_rules() {
        let store = RuleStore::new();
        let r1 = store.create_rule("r1", "", "a > 1").unwrap();
        let r2 = store.create_rule("r2", "", "b > 1").unwrap();
        let r3 = store.create_rule("r3", "", "c > 1").unwrap();

        let combined = store.combine(&[r1.id, r2.id, r3.id]).unwrap();
        assert!(combined.name.starts_with("Combined Rule "));
        assert_eq!(combined.description, COMBINED_RULE_DESCRIPTION);
        assert_eq!(combined.rule_string(), "((a > 1 OR b > 1) OR c > 1)");

        let only_r3 = record_from_pairs([("a", 0), ("b", 0), ("c", 2)]);
        assert!(store.evaluate(combined.id, &only_r3).unwrap());

        // Deleting a source leaves the combined tree intact
        store.delete(r1.id).unwrap();
        assert!(store.get(r1.id).is_none());
        assert!(store.evaluate(combined.id, &only_r3).unwrap());
        assert_eq!(
            store.get(combined.id).unwrap().rule_string(),
            "((a > 1 OR b > 1) OR c > 1)"
        );
    }

    #[test]
    fn test_combine_twice_gets_distinct_names() {
        let store = RuleStore::new();
        let r1 = store.create_rule("r1", "", "a > 1").unwrap();
        let r2 = store.create_rule("r2", "", "b > 1").unwrap();

        let first = store.combine(&[r1.id, r2.id]).unwrap();
        let second = store.combine(&[r2.id, r1.id]).unwrap();
        assert_ne!(first.name, second.name);
        assert_eq!(second.rule_string(), "(b > 1 OR a > 1)");
    }

    #[test]
    fn test_generated_names_skip_taken_suffixes() {
        let store = RuleStore::new();
        store.create_rule("Combined Rule 7", "", "a > 1").unwrap();
        // Next id is 3, so the first fallback is already taken
        store.create_rule("Combined Rule 7-3", "", "a > 1").unwrap();

        let inner = store.inner.read();
        assert_eq!(
            inner.unique_name("Combined Rule 7".to_string()),
            "Combined Rule 7-4"
        );
        assert_eq!(inner.unique_name("fresh".to_string()), "fresh");
    }

    #[test]
    fn test_combine_errors() {
        let store = RuleStore::new();
        let r1 = store.create_rule("r1", "", "a > 1").unwrap();

        let err = store.combine(&[r1.id]).unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Combine(CombineError::InsufficientRules { found: 1 })
        ));

        let err = store.combine(&[r1.id, RuleId(999)]).unwrap_err();
        assert!(matches!(err, RuleEngineError::RuleNotFound(999)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_field_surfaces() {
        let store = RuleStore::new();
        let rule = store.create_rule("r", "", "bonus > 5").unwrap();
        let err = store.evaluate(rule.id, &employee(40, "HR", 1)).unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Eval(EvalError::MissingField(field)) if field == "bonus"
        ));
    }

    #[test]
    fn test_delete_frees_name() {
        let store = RuleStore::new();
        let rule = store.create_rule("r", "", "a > 1").unwrap();
        store.delete(rule.id).unwrap();
        assert!(matches!(
            store.delete(rule.id),
            Err(RuleEngineError::RuleNotFound(_))
        ));
        assert!(store.create_rule("r", "", "a > 2").is_ok());
    }

    #[test]
    fn test_set_active_keeps_tree_and_version() {
        let store = RuleStore::new();
        let rule = store.create_rule("r", "", "a > 1").unwrap();

        let updated = store.set_active(rule.id, false).unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.version, rule.version);
        assert_eq!(updated.root_node, rule.root_node);
        assert!(!store.get(rule.id).unwrap().is_active);
    }

    #[test]
    fn test_load_rule_set_is_all_or_nothing() {
        let store = RuleStore::new();
        store.create_rule("existing", "", "a > 1").unwrap();

        let set = RuleSet {
            rules: vec![
                RuleDefinition::new("fresh", "", "b > 1"),
                RuleDefinition::new("existing", "", "c > 1"),
            ],
        };
        assert!(matches!(
            store.load_rule_set(&set),
            Err(RuleEngineError::DuplicateName(_))
        ));
        assert_eq!(store.len(), 1);

        let set = RuleSet {
            rules: vec![
                RuleDefinition::new("fresh", "", "b > 1"),
                RuleDefinition::new("broken", "", "(c > 1"),
            ],
        };
        assert!(store.load_rule_set(&set).is_err());
        assert_eq!(store.len(), 1);

        let set = RuleSet {
            rules: vec![
                RuleDefinition::new("fresh", "", "b > 1"),
                RuleDefinition::new("fresh", "", "c > 1"),
            ],
        };
        assert!(matches!(
            store.load_rule_set(&set),
            Err(RuleEngineError::DuplicateName(_))
        ));

        let set = RuleSet {
            rules: vec![
                RuleDefinition::new("fresh", "", "b > 1"),
                RuleDefinition::new("other", "desc", "c > 1"),
            ],
        };
        let loaded = store.load_rule_set(&set).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_by_name("other").unwrap().description, "desc");
    }

    #[test]
    fn test_requests() {
        let store = RuleStore::new();
        let r1 = store.create_rule("r1", "", "age > 30").unwrap();
        let r2 = store.create_rule("r2", "", "department = 'Sales'").unwrap();

        let request: EvaluateRequest = serde_json::from_str(&format!(
            r#"{{"ruleId": {}, "data": {{"age": 35}}}}"#,
            r1.id
        ))
        .unwrap();
        assert!(store.evaluate_request(&request).unwrap());

        let combined = store
            .combine_request(&CombineRequest {
                rule_ids: vec![r1.id.0, r2.id.0],
            })
            .unwrap();
        assert!(store
            .evaluate(combined.id, &employee(20, "Sales", 0))
            .unwrap());
    }

    #[test]
    fn test_concurrent_evaluation() {
        let store = RuleStore::new();
        let rule = store
            .create_rule("r", "", "(age > 30 AND department = 'Sales') OR salary > 50000")
            .unwrap();
        let id = rule.id;

        std::thread::scope(|scope| {
            for age in 25..35 {
                let store = store.clone();
                scope.spawn(move || {
                    let record = employee(age, "Sales", 1000);
                    assert_eq!(store.evaluate(id, &record).unwrap(), age > 30);
                });
            }
        });
    }
}
