//! Content validators applied to the node set at the last traversal level.
//!
//! Each validator is a pure function of its node collection. All of them stop
//! at the first offending node of their own collection; aggregation across
//! branches belongs to the traversal engine.

use crate::document::{Document, NodeId};
use crate::error::Diagnostic;
use crate::path::full_path;
use regex::Regex;
use serde::Serialize;

/// Outcome of validating one node collection, or of a whole traversal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidatorResult {
    pub passed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidatorResult {
    pub fn pass() -> Self {
        ValidatorResult {
            passed: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn fail(diagnostic: Diagnostic) -> Self {
        ValidatorResult {
            passed: false,
            diagnostics: vec![diagnostic],
        }
    }

    /// AND another result into this one, keeping every diagnostic.
    pub fn merge(&mut self, other: ValidatorResult) {
        self.passed &= other.passed;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// The fixed set of content checks.
#[derive(Clone, Debug)]
pub enum Validator {
    /// Passes iff the collection holds exactly `expected` nodes.
    Count { expected: usize },
    /// Passes iff no two nodes share the same text content.
    Unique,
    /// Passes iff every node's text fully matches `pattern`.
    Regex { pattern: Regex },
    /// Passes iff every node's text is one of `permitted`.
    ValueMembership { permitted: Vec<String> },
}

impl Validator {
    /// Builds a regex validator whose pattern must match the whole text.
    pub fn regex(pattern: &str) -> Result<Validator, regex::Error> {
        let anchored = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Validator::Regex { pattern: anchored })
    }

    pub fn value_membership<I, S>(permitted: I) -> Validator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Validator::ValueMembership {
            permitted: permitted.into_iter().map(Into::into).collect(),
        }
    }

    /// Short name used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Validator::Count { .. } => "count",
            Validator::Unique => "unique",
            Validator::Regex { .. } => "regex",
            Validator::ValueMembership { .. } => "values",
        }
    }

    pub fn check(&self, doc: &Document, nodes: &[NodeId]) -> ValidatorResult {
        match self {
            Validator::Count { expected } => check_count(doc, nodes, *expected),
            Validator::Unique => check_unique(doc, nodes),
            Validator::Regex { pattern } => check_regex(doc, nodes, pattern),
            Validator::ValueMembership { permitted } => check_values(doc, nodes, permitted),
        }
    }
}

fn check_count(doc: &Document, nodes: &[NodeId], expected: usize) -> ValidatorResult {
    if nodes.len() == expected {
        return ValidatorResult::pass();
    }
    ValidatorResult::fail(Diagnostic::error(
        "count_mismatch",
        nodes.first().map(|&n| full_path(doc, n)),
        format!(
            "expected count {} but actual count is {}",
            expected,
            nodes.len()
        ),
    ))
}

fn check_unique(doc: &Document, nodes: &[NodeId]) -> ValidatorResult {
    let texts: Vec<String> = nodes.iter().map(|&n| doc.text_content(n)).collect();
    for (i, current) in texts.iter().enumerate() {
        if texts[i + 1..].contains(current) {
            let path = full_path(doc, nodes[i]);
            return ValidatorResult::fail(Diagnostic::error(
                "duplicate_value",
                Some(path.clone()),
                format!("{} contains duplicate value of {}", path, current),
            ));
        }
    }
    ValidatorResult::pass()
}

fn check_regex(doc: &Document, nodes: &[NodeId], pattern: &Regex) -> ValidatorResult {
    for &node in nodes {
        let text = doc.text_content(node);
        if !pattern.is_match(&text) {
            let path = full_path(doc, node);
            return ValidatorResult::fail(Diagnostic::error(
                "pattern_mismatch",
                Some(path.clone()),
                format!("{} contains invalid value of {}", path, text),
            ));
        }
    }
    ValidatorResult::pass()
}

fn check_values(doc: &Document, nodes: &[NodeId], permitted: &[String]) -> ValidatorResult {
    for &node in nodes {
        let text = doc.text_content(node);
        if !permitted.contains(&text) {
            let path = full_path(doc, node);
            return ValidatorResult::fail(Diagnostic::error(
                "value_not_permitted",
                Some(path.clone()),
                format!("{} is not a permissible value for {}", text, path),
            ));
        }
    }
    ValidatorResult::pass()
}
