//! Running compiled rules against a document.

use crate::document::Document;
use crate::engine;
use crate::error::{Diagnostic, QueryError};
use crate::query::QueryEvaluator;
use crate::types::ValidationRule;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of a single rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
}

/// Outcome of every rule, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub outcomes: Vec<RuleOutcome>,
    pub summary: Summary,
}

impl Report {
    /// True when no rule failed.
    pub fn passed(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn get(&self, rule: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule == rule)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Evaluates every rule starting from the document element.
///
/// Each outcome is also emitted as a `tracing` event. Stops at the first
/// query error.
pub fn run<Q>(doc: &Document, rules: &[ValidationRule], evaluator: &Q) -> Result<Report, QueryError>
where
    Q: QueryEvaluator + ?Sized,
{
    let start = [doc.root()];
    let mut report = Report::default();

    for rule in rules {
        let result = engine::evaluate(doc, evaluator, &start, &rule.validator, &rule.query)?;

        if result.passed {
            info!(rule = %rule.name, validator = rule.validator.kind(), "rule passed");
            report.summary.passed += 1;
        } else {
            warn!(rule = %rule.name, validator = rule.validator.kind(), "rule failed");
            for diagnostic in &result.diagnostics {
                warn!(rule = %rule.name, code = %diagnostic.code, "{}", diagnostic.message);
            }
            report.summary.failed += 1;
        }

        report.outcomes.push(RuleOutcome {
            rule: rule.name.clone(),
            passed: result.passed,
            diagnostics: result.diagnostics,
        });
    }

    Ok(report)
}
