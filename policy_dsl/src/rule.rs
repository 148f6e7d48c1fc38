//! Rule evaluation: conditions plus optional nested boolean groups.
//!
//! A rule matches when it is enabled, every condition holds (an empty list
//! holds vacuously), and its nested group, if any, holds:
//!
//! - `and`: every nested rule matches
//! - `or`: at least one nested rule matches
//! - `not`: the first nested rule does NOT match; later entries are ignored
//!
//! The `not` form is single-operand. `validate_policy` reports a `not` group
//! that does not hold exactly one rule.

use serde_json::Value;
use tracing::{trace, warn};

use crate::condition::{context_value, evaluate_condition_in};
use crate::types::{DslPolicyContext, DslPolicyRule, NestedOperator};

/// Nesting deeper than this never matches.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Evaluate whether `rule` matches `context`.
pub fn evaluate_rule(rule: &DslPolicyRule, context: &DslPolicyContext) -> bool {
    evaluate_rule_in(rule, &context_value(context))
}

pub(crate) fn evaluate_rule_in(rule: &DslPolicyRule, root: &Value) -> bool {
    rule_matches(rule, root, 0)
}

fn rule_matches(rule: &DslPolicyRule, root: &Value, depth: usize) -> bool {
    if depth > MAX_NESTING_DEPTH {
        warn!(rule_id = %rule.id, depth, "rule nesting too deep; treating as no match");
        return false;
    }

    if !rule.enabled {
        trace!(rule_id = %rule.id, "rule disabled");
        return false;
    }

    if let Some(failed) = rule
        .conditions
        .iter()
        .position(|cond| !evaluate_condition_in(cond, root))
    {
        trace!(rule_id = %rule.id, condition = failed, "condition not met");
        return false;
    }

    let Some(nested) = &rule.nested else {
        return true;
    };

    let result = match nested.operator {
        NestedOperator::And => nested.rules.iter().all(|r| rule_matches(r, root, depth + 1)),
        NestedOperator::Or => nested.rules.iter().any(|r| rule_matches(r, root, depth + 1)),
        NestedOperator::Not => nested
            .rules
            .first()
            .is_some_and(|first| !rule_matches(first, root, depth + 1)),
    };
    trace!(rule_id = %rule.id, operator = %nested.operator, result, "nested group evaluated");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Actor, ConditionOperator, DslPolicyAction, PolicyCondition, Resource,
    };

    fn context() -> DslPolicyContext {
        DslPolicyContext::new(
            Actor::user("alice").with_roles(["admin"]),
            "delete",
            Resource::new("database").with_id("db-1"),
        )
    }

    fn rule(id: &str) -> DslPolicyRule {
        DslPolicyRule::new(id, id, DslPolicyAction::allow())
    }

    fn always(id: &str) -> DslPolicyRule {
        rule(id).with_condition(PolicyCondition::exists("actor.id"))
    }

    fn never(id: &str) -> DslPolicyRule {
        rule(id).with_condition(PolicyCondition::new(
            "actor.id",
            ConditionOperator::Eq,
            "nobody",
        ))
    }

    #[test]
    fn empty_rule_matches_vacuously() {
        assert!(evaluate_rule(&rule("r"), &context()));
    }

    #[test]
    fn disabled_rule_never_matches() {
        assert!(!evaluate_rule(&rule("r").with_enabled(false), &context()));
        assert!(!evaluate_rule(&always("r").with_enabled(false), &context()));
    }

    #[test]
    fn all_conditions_must_hold() {
        let r = rule("r").with_conditions([
            PolicyCondition::new("action", ConditionOperator::Eq, "delete"),
            PolicyCondition::new("resource.type", ConditionOperator::Eq, "database"),
        ]);
        assert!(evaluate_rule(&r, &context()));

        let r = r.with_condition(PolicyCondition::new("actor.type", ConditionOperator::Eq, "system"));
        assert!(!evaluate_rule(&r, &context()));
    }

    #[test]
    fn nested_and() {
        let r = rule("r").with_nested(NestedOperator::And, vec![always("a"), always("b")]);
        assert!(evaluate_rule(&r, &context()));
        let r = rule("r").with_nested(NestedOperator::And, vec![always("a"), never("b")]);
        assert!(!evaluate_rule(&r, &context()));
        let r = rule("r").with_nested(NestedOperator::And, vec![]);
        assert!(evaluate_rule(&r, &context()));
    }

    #[test]
    fn nested_or() {
        let r = rule("r").with_nested(NestedOperator::Or, vec![never("a"), always("b")]);
        assert!(evaluate_rule(&r, &context()));
        let r = rule("r").with_nested(NestedOperator::Or, vec![never("a"), never("b")]);
        assert!(!evaluate_rule(&r, &context()));
        let r = rule("r").with_nested(NestedOperator::Or, vec![]);
        assert!(!evaluate_rule(&r, &context()));
    }

    #[test]
    fn nested_not_negates_only_the_first_rule() {
        // `not` is single-operand: the second entry has no influence at all.
        let a_false = rule("r").with_nested(NestedOperator::Not, vec![never("a"), always("b")]);
        assert!(evaluate_rule(&a_false, &context()));
        let a_false_b_false =
            rule("r").with_nested(NestedOperator::Not, vec![never("a"), never("b")]);
        assert!(evaluate_rule(&a_false_b_false, &context()));

        let a_true = rule("r").with_nested(NestedOperator::Not, vec![always("a"), never("b")]);
        assert!(!evaluate_rule(&a_true, &context()));
        let a_true_b_true = rule("r").with_nested(NestedOperator::Not, vec![always("a"), always("b")]);
        assert!(!evaluate_rule(&a_true_b_true, &context()));
    }

    #[test]
    fn nested_not_without_rules_is_false() {
        let r = rule("r").with_nested(NestedOperator::Not, vec![]);
        assert!(!evaluate_rule(&r, &context()));
    }

    #[test]
    fn disabled_nested_rule_does_not_match() {
        let r = rule("r").with_nested(NestedOperator::Or, vec![always("a").with_enabled(false)]);
        assert!(!evaluate_rule(&r, &context()));
    }

    #[test]
    fn conditions_and_nested_are_combined() {
        let r = never("r").with_nested(NestedOperator::Or, vec![always("a")]);
        assert!(!evaluate_rule(&r, &context()));
    }

    #[test]
    fn excessive_nesting_does_not_match() {
        let mut r = rule("leaf");
        for depth in 0..=MAX_NESTING_DEPTH {
            r = rule(&format!("level-{depth}")).with_nested(NestedOperator::And, vec![r]);
        }
        assert!(!evaluate_rule(&r, &context()));

        let mut shallow = rule("leaf");
        for depth in 0..8 {
            shallow = rule(&format!("level-{depth}")).with_nested(NestedOperator::And, vec![shallow]);
        }
        assert!(evaluate_rule(&shallow, &context()));
    }
}
