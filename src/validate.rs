//! Rule-file validation against rules R-001 through R-005 and warnings W-001
//! through W-004.
//!
//! Returns **all** errors and warnings, not just the first. Validation does not
//! modify the rule file.

use crate::error::*;
use crate::query::QueryEvaluator;
use crate::types::*;
use crate::validator::Validator;
use std::collections::HashMap;

/// Validate a parsed rule file. Query expressions are checked with
/// `evaluator`'s [`QueryEvaluator::check`].
pub fn validate_rules<Q>(file: &RuleFile, evaluator: &Q) -> ValidationResult
where
    Q: QueryEvaluator + ?Sized,
{
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    w001_rules_non_empty(file, &mut warnings);
    w002_unique_rule_names(file, &mut warnings);

    for (i, rule) in file.rules.iter().enumerate() {
        let path = format!("rules[{}]", i);
        r001_query_non_empty(rule, &path, &mut errors);
        r002_query_expressions(rule, &path, evaluator, &mut errors);
        r003_exactly_one_assertion(rule, &path, &mut errors);
        r004_regex_valid(rule, &path, &mut errors);
        r005_unique_true(rule, &path, &mut errors);
        w003_values_non_empty(rule, &path, &mut warnings);
        w004_count_zero(rule, &path, &mut warnings);
    }

    ValidationResult { errors, warnings }
}

fn error(rule: &str, path: String, message: String) -> ValidationError {
    ValidationError {
        rule: rule.to_string(),
        path,
        message,
    }
}

// R-001: every rule needs at least one query level.
fn r001_query_non_empty(rule: &RuleSpec, path: &str, errors: &mut Vec<ValidationError>) {
    if rule.query.is_empty() {
        errors.push(error(
            "R-001",
            format!("{}.query", path),
            "query group must contain at least one expression".to_string(),
        ));
    }
}

// R-002: expressions must be non-blank and accepted by the evaluator.
fn r002_query_expressions<Q>(
    rule: &RuleSpec,
    path: &str,
    evaluator: &Q,
    errors: &mut Vec<ValidationError>,
) where
    Q: QueryEvaluator + ?Sized,
{
    for (depth, expression) in rule.query.iter().enumerate() {
        let at = format!("{}.query[{}]", path, depth);
        if expression.trim().is_empty() {
            errors.push(error("R-002", at, "query expression is empty".to_string()));
            continue;
        }
        if let Err(e) = evaluator.check(expression) {
            errors.push(error("R-002", at, e.to_string()));
        }
    }
}

// R-003: exactly one of count / unique / regex / values.
fn r003_exactly_one_assertion(rule: &RuleSpec, path: &str, errors: &mut Vec<ValidationError>) {
    let keys = rule.assertion_keys();
    match keys.len() {
        1 => {}
        0 => errors.push(error(
            "R-003",
            path.to_string(),
            "rule must declare one assertion: count, unique, regex, or values".to_string(),
        )),
        _ => errors.push(error(
            "R-003",
            path.to_string(),
            format!(
                "rule declares multiple assertions ({}); exactly one is allowed",
                keys.join(", ")
            ),
        )),
    }
}

// R-004: regex must compile.
fn r004_regex_valid(rule: &RuleSpec, path: &str, errors: &mut Vec<ValidationError>) {
    if let Some(pattern) = &rule.regex
        && let Err(e) = Validator::regex(pattern)
    {
        errors.push(error(
            "R-004",
            format!("{}.regex", path),
            format!("invalid regular expression: {}", e),
        ));
    }
}

// R-005: `unique: false` has no meaning.
fn r005_unique_true(rule: &RuleSpec, path: &str, errors: &mut Vec<ValidationError>) {
    if rule.unique == Some(false) {
        errors.push(error(
            "R-005",
            format!("{}.unique", path),
            "unique must be true when present".to_string(),
        ));
    }
}

fn w001_rules_non_empty(file: &RuleFile, warnings: &mut Vec<Diagnostic>) {
    if file.rules.is_empty() {
        warnings.push(Diagnostic::warning(
            "W-001",
            Some("rules".to_string()),
            "rule file declares no rules".to_string(),
        ));
    }
}

fn w002_unique_rule_names(file: &RuleFile, warnings: &mut Vec<Diagnostic>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, rule) in file.rules.iter().enumerate() {
        let Some(name) = rule.name.as_deref() else {
            continue;
        };
        if let Some(first) = seen.get(name) {
            warnings.push(Diagnostic::warning(
                "W-002",
                Some(format!("rules[{}].name", i)),
                format!("duplicate rule name '{}' (first used by rules[{}])", name, first),
            ));
        } else {
            seen.insert(name, i);
        }
    }
}

fn w003_values_non_empty(rule: &RuleSpec, path: &str, warnings: &mut Vec<Diagnostic>) {
    if let Some(values) = &rule.values
        && values.is_empty()
    {
        warnings.push(Diagnostic::warning(
            "W-003",
            Some(format!("{}.values", path)),
            "no permitted values: every matched node will fail".to_string(),
        ));
    }
}

// Empty branches are skipped, so a count of zero is never checked against anything.
fn w004_count_zero(rule: &RuleSpec, path: &str, warnings: &mut Vec<Diagnostic>) {
    if rule.count == Some(0) {
        warnings.push(Diagnostic::warning(
            "W-004",
            Some(format!("{}.count", path)),
            "count: 0 can never fail; branches without matches are skipped".to_string(),
        ));
    }
}
