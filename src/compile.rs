//! [`RuleFile`] → [`ValidationRule`] compilation.

use crate::error::ValidationError;
use crate::types::{QueryGroup, RuleFile, RuleSpec, ValidationRule};
use crate::validator::Validator;

/// Compile a rule file into immutable validation rules.
///
/// The rule file should have passed [`crate::validate::validate_rules`]; if it
/// did not, the first offending rule is reported.
pub fn compile(file: &RuleFile) -> Result<Vec<ValidationRule>, ValidationError> {
    file.rules
        .iter()
        .enumerate()
        .map(|(i, spec)| compile_rule(i, spec))
        .collect()
}

fn compile_rule(index: usize, spec: &RuleSpec) -> Result<ValidationRule, ValidationError> {
    let path = format!("rules[{}]", index);

    let query = QueryGroup::new(spec.query.iter().cloned()).ok_or_else(|| ValidationError {
        rule: "R-001".to_string(),
        path: format!("{}.query", path),
        message: "query group must contain at least one expression".to_string(),
    })?;

    let validator = match (&spec.count, &spec.unique, &spec.regex, &spec.values) {
        (Some(expected), None, None, None) => Validator::Count {
            expected: *expected,
        },
        (None, Some(true), None, None) => Validator::Unique,
        (None, None, Some(pattern), None) => {
            Validator::regex(pattern).map_err(|e| ValidationError {
                rule: "R-004".to_string(),
                path: format!("{}.regex", path),
                message: format!("invalid regular expression: {}", e),
            })?
        }
        (None, None, None, Some(values)) => Validator::value_membership(values.iter().cloned()),
        _ => {
            return Err(ValidationError {
                rule: "R-003".to_string(),
                path,
                message: "rule must declare exactly one valid assertion".to_string(),
            });
        }
    };

    Ok(ValidationRule {
        name: spec.display_name(index),
        description: spec.description.clone(),
        query,
        validator,
    })
}
