//! Parsed rule cache - avoids re-parsing rule strings seen before

use crate::error::Result;
use crate::record::Record;
use crate::rule::ast::AstNode;
use crate::rule::evaluator::evaluate;
use crate::rule::parser;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

/// Global rule cache with fast hashing (ahash)
static RULE_CACHE: Lazy<RwLock<AHashMap<String, AstNode>>> = Lazy::new(|| {
    let map = AHashMap::with_capacity(256);
    RwLock::new(map)
});

/// Get or parse a rule string, using cache for repeated rules.
/// Parse failures are not cached.
#[inline]
pub fn get_or_parse(rule: &str) -> Result<AstNode> {
    // Fast path: check read lock first
    {
        let cache = RULE_CACHE.read();
        if let Some(ast) = cache.get(rule) {
            return Ok(ast.clone());
        }
    }

    // Slow path: parse and cache
    debug!(rule, "rule cache miss");
    let ast = parser::parse_rule(rule)?;

    {
        let mut cache = RULE_CACHE.write();
        cache.insert(rule.to_string(), ast.clone());
    }

    Ok(ast)
}

/// Evaluate a rule string against a record, using cached AST
#[inline]
pub fn check_rule(rule: &str, record: &Record) -> Result<bool> {
    let ast = get_or_parse(rule)?;
    Ok(evaluate(&ast, record)?)
}

/// Clear the rule cache
pub fn clear_cache() {
    let mut cache = RULE_CACHE.write();
    cache.clear();
}

/// Whether a rule string currently has a cached tree
pub fn is_cached(rule: &str) -> bool {
    let cache = RULE_CACHE.read();
    cache.contains_key(rule)
}

/// Get cache statistics
pub fn cache_size() -> usize {
    let cache = RULE_CACHE.read();
    cache.len()
}
