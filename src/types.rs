use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Index;

use crate::validator::Validator;

// ─── Rule file ──────────────────────────────────────────────────────────────

/// The top-level container of a parsed rule file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Extension fields (x-* prefixed).
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// One rule as written in the rule file, before compilation.
///
/// Exactly one of the assertion keys (`count`, `unique`, `regex`, `values`)
/// must be present; `validate_rules` enforces this.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Query group; a bare string is accepted as a group of one.
    #[serde(deserialize_with = "deserialize_query")]
    pub query: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Extension fields (x-* prefixed).
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

impl RuleSpec {
    /// Names of the assertion keys present on this rule, in declaration order.
    pub fn assertion_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.count.is_some() {
            keys.push("count");
        }
        if self.unique.is_some() {
            keys.push("unique");
        }
        if self.regex.is_some() {
            keys.push("regex");
        }
        if self.values.is_some() {
            keys.push("values");
        }
        keys
    }

    /// Display name: the declared name or `rule[{index}]`.
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("rule[{}]", index))
    }
}

fn deserialize_query<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

// ─── Compiled rules ─────────────────────────────────────────────────────────

/// An ordered, non-empty sequence of query expressions, one per traversal depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryGroup(Vec<String>);

impl QueryGroup {
    /// Returns `None` for an empty group.
    pub fn new<I, S>(expressions: I) -> Option<QueryGroup>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let expressions: Vec<String> = expressions.into_iter().map(Into::into).collect();
        if expressions.is_empty() {
            None
        } else {
            Some(QueryGroup(expressions))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, depth: usize) -> &str {
        &self.0[depth]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Index<usize> for QueryGroup {
    type Output = str;

    fn index(&self, depth: usize) -> &str {
        &self.0[depth]
    }
}

/// A query group paired with the validator applied at its last level.
#[derive(Clone, Debug)]
pub struct ValidationRule {
    pub name: String,
    pub description: Option<String>,
    pub query: QueryGroup,
    pub validator: Validator,
}

impl ValidationRule {
    pub fn new(name: impl Into<String>, query: QueryGroup, validator: Validator) -> Self {
        ValidationRule {
            name: name.into(),
            description: None,
            query,
            validator,
        }
    }
}
