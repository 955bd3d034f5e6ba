//! Declarative structural and content assertions over XML documents.
//!
//! A rule pairs a *query group* (an ordered list of path queries, one per
//! traversal level) with a content check applied to the nodes matched at the
//! last level: an exact count, uniqueness of text, a regular expression, or a
//! set of permitted values.
//!
//! ```text
//! parse_document(xml) → Document ──────────────────────────┐
//! parse_rules(yaml) → RuleFile → validate_rules → compile → run → Report → serialize_report
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! let xml = r#"
//! <bookstore>
//!   <book><title>Rust</title></book>
//!   <book><title>XML</title></book>
//! </bookstore>
//! "#;
//!
//! let rules = r#"
//! rules:
//!   - name: two books
//!     query: [book]
//!     count: 2
//!   - name: titles are unique
//!     query: [book, title]
//!     unique: true
//! "#;
//!
//! let result = xmlassert::check(xml, rules).expect("valid inputs");
//! assert!(result.report.passed());
//! ```
//!
//! # Traversal semantics
//!
//! For every node matched by `query[0]`, every node matched by `query[1]` from
//! it, and so on, the validator runs on the matches of the last query. A
//! branch that matches nothing is skipped: missing structure is never a
//! failure, only present-but-invalid content is.
//!
//! # Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | yes     | The `xmlassert` command-line binary. |

pub mod compile;
pub mod document;
pub mod engine;
pub mod error;
pub mod parse;
pub mod path;
pub mod query;
pub mod report;
pub mod serialize;
pub mod types;
pub mod validate;
pub mod validator;

pub use error::*;
pub use types::*;

pub use compile::compile;
pub use document::{Document, NodeId, parse_document};
pub use engine::evaluate;
pub use parse::parse_rules;
pub use path::full_path;
pub use query::{PathEvaluator, QueryEvaluator};
pub use report::{Report, run};
pub use serialize::{Format, serialize_report};
pub use validate::validate_rules;
pub use validator::{Validator, ValidatorResult};

/// Result of the [`check`] convenience entry point.
pub struct CheckResult {
    pub report: Report,
    /// Non-fatal warnings produced while validating the rule file.
    pub warnings: Vec<Diagnostic>,
}

/// Convenience entry point composing parse → validate → compile → run with the
/// default [`PathEvaluator`].
///
/// # Errors
///
/// Returns every rule-file error found by validation, or the first parse or
/// query error.
pub fn check(xml: &str, rules: &str) -> Result<CheckResult, Vec<XmlAssertError>> {
    let evaluator = PathEvaluator::new();

    let file = parse::parse_rules(rules).map_err(|e| vec![XmlAssertError::Parse(e)])?;
    let validation = validate::validate_rules(&file, &evaluator);
    if !validation.errors.is_empty() {
        return Err(validation
            .errors
            .into_iter()
            .map(XmlAssertError::Validation)
            .collect());
    }
    let compiled = compile::compile(&file).map_err(|e| vec![XmlAssertError::Validation(e)])?;

    let doc = document::parse_document(xml).map_err(|e| vec![XmlAssertError::Parse(e)])?;
    let report =
        report::run(&doc, &compiled, &evaluator).map_err(|e| vec![XmlAssertError::Query(e)])?;

    Ok(CheckResult {
        report,
        warnings: validation.warnings,
    })
}
