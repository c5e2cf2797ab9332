// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rule definitions
//!
//! Types for the `rules.json` file shipped in a rule bundle:
//!
//! ```json
//! { "version": 1,
//!   "rules": [ { "condition": { "type": "group", "definition": { ... } },
//!                "consequences": [ { "id": "...", "type": "iam", "detail": { ... } } ] } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Consequence type of in-app messages.
pub const IN_APP_MESSAGE_TYPE: &str = "iam";

/// Template of full-screen messages, the only ones with remote assets.
pub const FULLSCREEN_TEMPLATE: &str = "fullscreen";

/// Top-level `rules.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub rules: Vec<LaunchRule>,
}

fn default_version() -> u32 {
    1
}

/// A condition and the consequences fired when it matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRule {
    pub condition: RuleCondition,
    #[serde(default)]
    pub consequences: Vec<Consequence>,
}

/// Action produced by a matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    pub id: String,
    #[serde(rename = "type")]
    pub consequence_type: String,
    #[serde(default)]
    pub detail: Map<String, Value>,
}

impl Consequence {
    /// Whether this consequence is an in-app message
    pub fn is_in_app_message(&self) -> bool {
        self.consequence_type == IN_APP_MESSAGE_TYPE
    }

    /// `detail.template`, if present
    pub fn template(&self) -> Option<&str> {
        self.detail.get("template").and_then(Value::as_str)
    }

    /// Whether this is a full-screen in-app message
    pub fn is_fullscreen_message(&self) -> bool {
        self.is_in_app_message() && self.template() == Some(FULLSCREEN_TEMPLATE)
    }

    /// `detail.remoteAssets` as alternative groups; malformed entries are skipped
    pub fn remote_assets(&self) -> Vec<Vec<String>> {
        let Some(Value::Array(groups)) = self.detail.get("remoteAssets") else {
            return Vec::new();
        };
        groups
            .iter()
            .filter_map(Value::as_array)
            .map(|group| {
                group
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect()
    }
}

/// Rule condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "definition", rename_all = "lowercase")]
pub enum RuleCondition {
    Group(GroupCondition),
    Matcher(MatcherCondition),
}

/// Logical combination of nested conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCondition {
    pub logic: GroupLogic,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLogic {
    And,
    Or,
}

/// Comparison of one event-data key against candidate values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherCondition {
    pub key: String,
    pub matcher: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl RuleCondition {
    /// Evaluate against flat event data
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        match self {
            RuleCondition::Group(group) => match group.logic {
                GroupLogic::And => group.conditions.iter().all(|c| c.matches(data)),
                GroupLogic::Or => group.conditions.iter().any(|c| c.matches(data)),
            },
            RuleCondition::Matcher(matcher) => matcher.matches(data),
        }
    }
}

impl MatcherCondition {
    fn matches(&self, data: &Map<String, Value>) -> bool {
        let actual = data.get(&self.key).filter(|v| !v.is_null());
        match self.matcher.as_str() {
            "ex" => actual.is_some(),
            "nx" => actual.is_none(),
            "ne" => match actual {
                Some(actual) => !self.values.iter().any(|v| values_equal(actual, v)),
                None => true,
            },
            "nc" => match actual {
                Some(actual) => !self.any_str(actual, |a, v| a.contains(v)),
                None => true,
            },
            op => {
                let Some(actual) = actual else {
                    return false;
                };
                match op {
                    "eq" => self.values.iter().any(|v| values_equal(actual, v)),
                    "co" => self.any_str(actual, |a, v| a.contains(v)),
                    "sw" => self.any_str(actual, |a, v| a.starts_with(v)),
                    "ew" => self.any_str(actual, |a, v| a.ends_with(v)),
                    "gt" => self.any_num(actual, |a, v| a > v),
                    "ge" => self.any_num(actual, |a, v| a >= v),
                    "lt" => self.any_num(actual, |a, v| a < v),
                    "le" => self.any_num(actual, |a, v| a <= v),
                    _ => false,
                }
            }
        }
    }

    fn any_str(&self, actual: &Value, cmp: impl Fn(&str, &str) -> bool) -> bool {
        let actual = value_as_lower_string(actual);
        self.values
            .iter()
            .any(|v| cmp(&actual, &value_as_lower_string(v)))
    }

    fn any_num(&self, actual: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
        let Some(actual) = value_as_f64(actual) else {
            return false;
        };
        self.values
            .iter()
            .filter_map(value_as_f64)
            .any(|v| cmp(actual, v))
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (value_as_f64(actual), value_as_f64(expected)) {
        (Some(a), Some(b)) if !actual.is_string() || !expected.is_string() => a == b,
        _ => value_as_lower_string(actual) == value_as_lower_string(expected),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_lower_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

/// Errors parsing `rules.json`
#[derive(Debug, Error)]
pub enum RuleParseError {
    #[error("invalid rules JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported rules version: {0}")]
    UnsupportedVersion(u32),
}

/// Parse a `rules.json` payload into launch rules
pub fn parse_rules(data: &[u8]) -> Result<Vec<LaunchRule>, RuleParseError> {
    let document: RulesDocument = serde_json::from_slice(data)?;
    if document.version != 1 {
        return Err(RuleParseError::UnsupportedVersion(document.version));
    }
    Ok(document.rules)
}
