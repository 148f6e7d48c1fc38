use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use policy_dsl::{DslPolicyResult, evaluate_policy, evaluate_policy_at, validate_policy};
use tracing::{Level, info, instrument, warn};

use crate::exit_code;
use crate::load::{load_context, load_document};
use crate::style;

/// Evaluate the policy at `policy` for the request in `context`.
///
/// The result goes to stdout as JSON and a one-line summary to stderr. A
/// document with validation errors is never evaluated; the request is refused.
#[instrument(level = Level::TRACE)]
pub fn run(policy: &Path, context: &Path, at: Option<DateTime<Utc>>) -> Result<u8> {
    let doc = load_document(policy)?;

    let issues = validate_policy(&doc);
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    if !errors.is_empty() {
        warn!(policy = %doc.name, errors = errors.len(), "refusing to evaluate invalid policy");
        for issue in &errors {
            eprintln!("{} {}: {}", style::err_red_bold("error"), issue.path, issue.message);
        }
        eprintln!(
            "{} policy {} has {} validation error(s); request not allowed",
            style::err_red_bold("refused:"),
            doc.name,
            errors.len()
        );
        return Ok(exit_code::NOT_ALLOWED);
    }

    let ctx = load_context(context)?;
    let result = match at {
        Some(timestamp) => evaluate_policy_at(&doc, &ctx, timestamp),
        None => evaluate_policy(&doc, &ctx),
    };
    info!(
        policy = %doc.name,
        allowed = result.allowed,
        matched = ?result.matched_rule_id,
        "evaluated"
    );

    let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    println!("{json}");
    eprintln!("{}", summary(&result));

    Ok(if result.allowed {
        exit_code::SUCCESS
    } else {
        exit_code::NOT_ALLOWED
    })
}

/// `<action>  <reason>` for the terminal.
pub fn summary(result: &DslPolicyResult) -> String {
    let reason = result.reasons.join("; ");
    format!("{}  {}", style::action(result.action.kind), style::err_dim(&reason))
}
