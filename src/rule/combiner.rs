//! Rule combiner

use crate::error::CombineError;
use crate::rule::ast::{AstNode, LogicalOp, MAX_DEPTH};

/// Minimum number of rule trees `combine` accepts
pub const MIN_COMBINE_COUNT: usize = 2;

/// Merge rule trees into one under a left-associative chain of `OR`s:
/// `OR(OR(r0, r1), r2)`, ... in input order.
///
/// Every input subtree is deep-copied into the result, so the combined tree
/// owns all of its nodes and outlives the rules it was built from. Each
/// extra rule adds a level, so the result must stay within `MAX_DEPTH`.
pub fn combine<'a, I>(roots: I) -> Result<AstNode, CombineError>
where
    I: IntoIterator<Item = &'a AstNode>,
{
    let roots: Vec<&AstNode> = roots.into_iter().collect();
    if roots.len() < MIN_COMBINE_COUNT {
        return Err(CombineError::InsufficientRules { found: roots.len() });
    }

    let depth = roots[1..]
        .iter()
        .fold(roots[0].depth(), |acc, root| 1 + acc.max(root.depth()));
    if depth > MAX_DEPTH {
        return Err(CombineError::TooDeep {
            depth,
            limit: MAX_DEPTH,
        });
    }

    let mut iter = roots.into_iter().cloned();
    let first = match iter.next() {
        Some(node) => node,
        None => return Err(CombineError::InsufficientRules { found: 0 }),
    };

    Ok(iter.fold(first, |acc, node| {
        AstNode::operator(LogicalOp::Or, acc, node)
    }))
}
