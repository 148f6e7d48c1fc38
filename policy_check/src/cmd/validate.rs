use std::path::Path;

use anyhow::Result;
use policy_dsl::{ValidationIssue, validate_policy};
use tracing::{Level, info, instrument};

use crate::exit_code;
use crate::load::load_document;
use crate::style;

/// Print every finding for the document at `path`.
///
/// Fails on any error, and on warnings when `strict`.
#[instrument(level = Level::TRACE)]
pub fn run(path: &Path, strict: bool) -> Result<u8> {
    let doc = load_document(path)?;
    let issues = validate_policy(&doc);
    print!("{}", report(&doc.name, &issues));

    let errors = issues.iter().filter(|i| i.is_error()).count();
    let failed = errors > 0 || (strict && !issues.is_empty());
    info!(policy = %doc.name, errors, warnings = issues.len() - errors, failed, "validated");
    Ok(if failed {
        exit_code::FAILURE
    } else {
        exit_code::SUCCESS
    })
}

/// One line per issue, then a summary line.
pub fn report(name: &str, issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    for issue in issues {
        out += &format!(
            "{} {}: {}\n",
            style::severity(issue.severity),
            style::cyan(&issue.path),
            issue.message
        );
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    if issues.is_empty() {
        out += &format!("{} {}\n", style::green("ok"), style::bold(name));
    } else {
        out += &format!(
            "{}: {} error{}, {} warning{}\n",
            style::bold(name),
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use policy_dsl::{
        DslPolicyAction, DslPolicyDocument, DslPolicyRule, PolicyCondition, create_allow_policy,
    };

    use super::*;

    #[test]
    fn clean_report() {
        style::set_colors(false);
        let doc = create_allow_policy("open");
        assert_eq!(report(&doc.name, &validate_policy(&doc)), "ok open\n");
    }

    #[test]
    fn report_lists_issues_then_counts() {
        style::set_colors(false);
        let rule = DslPolicyRule::new("dup", "D", DslPolicyAction::allow())
            .with_condition(PolicyCondition::exists("actor.id"));
        let doc = DslPolicyDocument::new("1", "p", DslPolicyAction::deny())
            .with_rule(rule.clone())
            .with_rule(rule)
            .with_rule(DslPolicyRule::new("bare", "B", DslPolicyAction::allow()));
        let text = report(&doc.name, &validate_policy(&doc));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "error rules[1].id: Duplicate rule ID: dup");
        assert!(lines[1].starts_with("warning rules[2].conditions: "));
        assert_eq!(lines[2], "p: 1 error, 1 warning");
    }
}
