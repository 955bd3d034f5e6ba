//! Recursive traversal over a query group.
//!
//! For every node in the current set, the query for the current depth is
//! evaluated from that node. Branches that match nothing are skipped and never
//! fail the rule. At the last depth the validator runs on each branch's
//! matches; above it, the matches become the next level's node set. The rule
//! passes only if every validated branch passes.

use crate::document::{Document, NodeId};
use crate::error::QueryError;
use crate::path::full_path;
use crate::query::QueryEvaluator;
use crate::types::QueryGroup;
use crate::validator::{Validator, ValidatorResult};
use tracing::debug;

/// Evaluates `group` from `nodes` and applies `validator` to every final branch.
///
/// Failing branches do not stop the traversal: their diagnostics are all
/// collected. A query error aborts the evaluation.
pub fn evaluate<Q>(
    doc: &Document,
    evaluator: &Q,
    nodes: &[NodeId],
    validator: &Validator,
    group: &QueryGroup,
) -> Result<ValidatorResult, QueryError>
where
    Q: QueryEvaluator + ?Sized,
{
    evaluate_level(doc, evaluator, nodes, validator, group, 0)
}

fn evaluate_level<Q>(
    doc: &Document,
    evaluator: &Q,
    nodes: &[NodeId],
    validator: &Validator,
    group: &QueryGroup,
    depth: usize,
) -> Result<ValidatorResult, QueryError>
where
    Q: QueryEvaluator + ?Sized,
{
    let expression = group.get(depth);
    let last = depth + 1 == group.len();
    let mut result = ValidatorResult::pass();

    for &node in nodes {
        let sub_nodes = evaluator.select(doc, node, expression)?;
        if sub_nodes.is_empty() {
            debug!(depth, expression, context = %full_path(doc, node), "no matches, branch skipped");
            continue;
        }

        let branch = if last {
            let outcome = validator.check(doc, &sub_nodes);
            debug!(
                depth,
                expression,
                context = %full_path(doc, node),
                matched = sub_nodes.len(),
                validator = validator.kind(),
                passed = outcome.passed,
                "branch validated"
            );
            outcome
        } else {
            evaluate_level(doc, evaluator, &sub_nodes, validator, group, depth + 1)?
        };
        result.merge(branch);
    }

    Ok(result)
}
