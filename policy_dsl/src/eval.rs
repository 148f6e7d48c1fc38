//! Policy evaluation: document × context → [`DslPolicyResult`].
//!
//! Rules are visited in ascending `priority` (ties keep document order) and the
//! first matching rule decides. Rules after it are never evaluated. When
//! nothing matches, the document's default action applies.

use chrono::{DateTime, Utc};
use tracing::{Level, debug, instrument, trace};

use crate::condition::context_value;
use crate::rule::evaluate_rule_in;
use crate::types::{
    DslPolicyAction, DslPolicyContext, DslPolicyDocument, DslPolicyResult, PolicyAudit,
};

/// Reason reported when the default action applies.
pub const DEFAULT_ACTION_REASON: &str = "No matching rules, using default action";

/// Evaluate `document` against `context`, stamping the audit record with the
/// current time.
pub fn evaluate_policy(document: &DslPolicyDocument, context: &DslPolicyContext) -> DslPolicyResult {
    evaluate_policy_at(document, context, Utc::now())
}

/// Same as [`evaluate_policy`] with an explicit audit timestamp.
#[instrument(level = Level::TRACE, skip(document, context), fields(policy = %document.name))]
pub fn evaluate_policy_at(
    document: &DslPolicyDocument,
    context: &DslPolicyContext,
    timestamp: DateTime<Utc>,
) -> DslPolicyResult {
    let root = context_value(context);

    // `sort_by_key` is stable, so equal priorities keep document order.
    let mut ordered: Vec<_> = document.rules.iter().collect();
    ordered.sort_by_key(|rule| rule.priority);

    debug!(
        rules = ordered.len(),
        action = %context.action,
        actor = %context.actor.id,
        "evaluating policy"
    );

    for (idx, rule) in ordered.iter().enumerate() {
        if !evaluate_rule_in(rule, &root) {
            trace!(idx, rule_id = %rule.id, "rule skipped");
            continue;
        }

        debug!(idx, rule_id = %rule.id, action = ?rule.action.kind, "rule matched");
        return decision(
            document,
            context,
            timestamp,
            &rule.action,
            Some(rule.id.clone()),
            format!("Rule \"{}\" ({}) matched", rule.name, rule.id),
            idx + 1,
        );
    }

    debug!(action = ?document.default_action.kind, "no rules matched, using default");
    decision(
        document,
        context,
        timestamp,
        &document.default_action,
        None,
        DEFAULT_ACTION_REASON.to_string(),
        ordered.len(),
    )
}

fn decision(
    document: &DslPolicyDocument,
    context: &DslPolicyContext,
    timestamp: DateTime<Utc>,
    action: &DslPolicyAction,
    matched_rule_id: Option<String>,
    reason: String,
    evaluated_rules: usize,
) -> DslPolicyResult {
    DslPolicyResult {
        allowed: action.is_allow(),
        action: action.clone(),
        matched_rule_id,
        reasons: vec![reason],
        audit: PolicyAudit {
            timestamp,
            policy_version: document.version.clone(),
            evaluated_rules,
            context: context.clone(),
        },
    }
}
