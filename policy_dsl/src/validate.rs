//! Static structural checks over a policy document.
//!
//! Validation needs no context and never fails: every finding comes back as a
//! [`ValidationIssue`] so tooling can show all of them at once. What to do with
//! errors (reject the document, refuse to save it, ...) is up to the caller.

use std::collections::HashSet;

use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use crate::condition::REGEX_SIZE_LIMIT;
use crate::types::{
    ActionType, ConditionOperator, DslPolicyAction, DslPolicyDocument, DslPolicyRule,
    NestedOperator, Severity, ValidationIssue,
};

/// Check `document` for structural problems.
pub fn validate_policy(document: &DslPolicyDocument) -> Vec<ValidationIssue> {
    let mut issues = Issues::default();

    if document.version.trim().is_empty() {
        issues.error("version", "Policy version is required");
    }
    if document.name.trim().is_empty() {
        issues.error("name", "Policy name is required");
    }
    if document.default_action.kind.is_none() {
        issues.error("defaultAction.type", "Default action type is required");
    }
    check_action(&mut issues, "defaultAction", &document.default_action);

    // Rule ids are unique across the whole document, nested rules included.
    let mut seen = HashSet::new();
    for (i, rule) in document.rules.iter().enumerate() {
        check_rule(&mut issues, &mut seen, &format!("rules[{i}]"), rule);
    }

    debug!(
        policy = %document.name,
        errors = issues.0.iter().filter(|i| i.is_error()).count(),
        warnings = issues.0.iter().filter(|i| !i.is_error()).count(),
        "policy validated"
    );
    issues.0
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>, severity: Severity) {
        self.0.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity,
        });
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, message, Severity::Error);
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, message, Severity::Warning);
    }
}

fn check_rule<'d>(
    issues: &mut Issues,
    seen: &mut HashSet<&'d str>,
    path: &str,
    rule: &'d DslPolicyRule,
) {
    if rule.id.trim().is_empty() {
        issues.error(format!("{path}.id"), "Rule ID is required");
    } else if !seen.insert(rule.id.as_str()) {
        issues.error(
            format!("{path}.id"),
            format!("Duplicate rule ID: {}", rule.id),
        );
    }
    if rule.name.trim().is_empty() {
        issues.error(format!("{path}.name"), "Rule name is required");
    }
    if rule.action.kind.is_none() {
        issues.error(format!("{path}.action.type"), "Rule action type is required");
    }
    check_action(issues, &format!("{path}.action"), &rule.action);

    if rule.conditions.is_empty() && rule.nested.is_none() {
        issues.warning(
            format!("{path}.conditions"),
            "Rule has no conditions and will match every request",
        );
    }

    for (j, cond) in rule.conditions.iter().enumerate() {
        let cond_path = format!("{path}.conditions[{j}]");
        if cond.field.trim().is_empty() {
            issues.error(format!("{cond_path}.field"), "Condition field is required");
        }
        let Some(operator) = cond.operator else {
            issues.error(format!("{cond_path}.operator"), "Condition operator is required");
            continue;
        };
        match (operator, &cond.value) {
            (ConditionOperator::In | ConditionOperator::Nin, Value::Array(_)) => {}
            (ConditionOperator::In | ConditionOperator::Nin, _) => issues.warning(
                format!("{cond_path}.value"),
                format!("Operator '{operator}' expects an array value and will never match"),
            ),
            (ConditionOperator::Matches, Value::String(pattern)) => {
                if let Err(err) = RegexBuilder::new(pattern)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                {
                    issues.warning(
                        format!("{cond_path}.value"),
                        format!("Invalid regular expression, condition will never match: {err}"),
                    );
                }
            }
            (ConditionOperator::Matches, _) => issues.warning(
                format!("{cond_path}.value"),
                "Operator 'matches' expects a string pattern and will never match",
            ),
            _ => {}
        }
    }

    if let Some(nested) = &rule.nested {
        let nested_path = format!("{path}.nested");
        if nested.operator == NestedOperator::Not && nested.rules.len() != 1 {
            issues.error(
                format!("{nested_path}.rules"),
                format!(
                    "'not' negates exactly one rule, found {}; only the first would be used",
                    nested.rules.len()
                ),
            );
        }
        for (k, child) in nested.rules.iter().enumerate() {
            check_rule(issues, seen, &format!("{nested_path}.rules[{k}]"), child);
        }
    }
}

fn check_action(issues: &mut Issues, path: &str, action: &DslPolicyAction) {
    if action.kind != Some(ActionType::RequireApproval) {
        return;
    }
    match &action.approval {
        None => issues.warning(
            format!("{path}.approval"),
            "require_approval action has no approval settings",
        ),
        Some(approval) if approval.min_approvers == 0 => issues.warning(
            format!("{path}.approval.minApprovers"),
            "minApprovers should be at least 1",
        ),
        Some(_) => {}
    }
}
