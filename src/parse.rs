use crate::error::{ParseError, ParseErrorKind};
use crate::types::RuleFile;

/// Parse a YAML rule file into an unvalidated [`RuleFile`].
///
/// Performs YAML deserialization and type mapping only.
/// Does NOT check rule constraints; see [`crate::validate::validate_rules`].
pub fn parse_rules(input: &str) -> Result<RuleFile, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Syntax, "empty input"));
    }

    check_multi_document(input)?;

    // YAML → serde_json::Value → RuleFile, so both stages report through serde.
    let value: serde_json::Value = serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError::new(classify_saphyr_error(&msg), msg)
    })?;

    let Some(obj) = value.as_object() else {
        return Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "rule file root must be a YAML mapping",
        ));
    };

    if let Some(rules) = obj.get("rules")
        && !rules.is_array()
    {
        return Err(ParseError {
            path: Some("rules".to_string()),
            ..ParseError::new(ParseErrorKind::TypeMismatch, "'rules' must be a sequence")
        });
    }

    let file: RuleFile = serde_json::from_value(value).map_err(|e| {
        let msg = e.to_string();
        ParseError::new(classify_json_error(&msg), msg)
    })?;

    check_extensions(&file.extensions, "")?;
    for (i, rule) in file.rules.iter().enumerate() {
        check_extensions(&rule.extensions, &format!("rules[{}]", i))?;
    }

    Ok(file)
}

/// Unknown keys are captured by `#[serde(flatten)]`; only `x-*` keys may remain.
fn check_extensions(
    extensions: &std::collections::HashMap<String, serde_json::Value>,
    path: &str,
) -> Result<(), ParseError> {
    let mut keys: Vec<&String> = extensions.keys().collect();
    keys.sort();
    for key in keys {
        if !key.starts_with("x-") {
            let full = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            return Err(ParseError {
                path: Some(full),
                ..ParseError::new(
                    ParseErrorKind::UnknownField,
                    format!(
                        "unknown field '{}'{} (extension fields must start with 'x-')",
                        key,
                        if path.is_empty() {
                            String::new()
                        } else {
                            format!(" at {}", path)
                        }
                    ),
                )
            });
        }
    }
    Ok(())
}

/// Check for multiple YAML documents (--- separator).
/// Only matches `---` at column 0 to avoid false positives inside block scalars.
fn check_multi_document(input: &str) -> Result<(), ParseError> {
    let mut doc_count = 0;
    for (line_num, line) in input.lines().enumerate() {
        if line.starts_with("---") && line[3..].trim().is_empty() {
            doc_count += 1;
            if doc_count > 1 {
                return Err(ParseError {
                    line: Some(line_num + 1),
                    column: Some(1),
                    ..ParseError::new(
                        ParseErrorKind::Syntax,
                        "multi-document YAML is not supported",
                    )
                });
            }
        }
    }
    Ok(())
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("type") || lower.contains("invalid") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("unknown field") {
        ParseErrorKind::UnknownField
    } else if lower.contains("missing field")
        || lower.contains("invalid type")
        || lower.contains("invalid value")
        || lower.contains("did not match any variant")
    {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}
