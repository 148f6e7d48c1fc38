//! Condition evaluation: one [`PolicyCondition`] against a context.
//!
//! The context is looked at through its serialized (camelCase) JSON form, so
//! `actor.roles`, `resource.attributes.owner` and `environment.ipAddress` are all
//! valid field paths. A path that runs off the end of the data resolves to
//! "missing". Every operator returns a plain `bool`; a type mismatch is `false`.

use regex::RegexBuilder;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::types::{ConditionOperator, DslPolicyContext, PolicyCondition};

/// Upper bound on the compiled size of a `matches` pattern.
pub const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Evaluate a single condition against `context`.
pub fn evaluate_condition(condition: &PolicyCondition, context: &DslPolicyContext) -> bool {
    evaluate_condition_in(condition, &context_value(context))
}

/// Serialized view of a context used for field resolution.
pub(crate) fn context_value(context: &DslPolicyContext) -> Value {
    serde_json::to_value(context).unwrap_or_else(|err| {
        warn!(%err, "context did not serialize; every field resolves as missing");
        Value::Null
    })
}

/// Walk a dotted path (`a.b.c`) through objects and, by numeric segment, arrays.
pub fn resolve_field<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

pub(crate) fn evaluate_condition_in(condition: &PolicyCondition, root: &Value) -> bool {
    let Some(operator) = condition.operator else {
        trace!(field = %condition.field, "condition has no operator");
        return false;
    };

    let resolved = resolve_field(root, &condition.field);
    let expected = &condition.value;

    let result = match operator {
        ConditionOperator::Eq => resolved.is_some_and(|v| strict_eq(v, expected)),
        ConditionOperator::Ne => !resolved.is_some_and(|v| strict_eq(v, expected)),
        ConditionOperator::Gt => numbers(resolved, expected).is_some_and(|(a, b)| a > b),
        ConditionOperator::Gte => numbers(resolved, expected).is_some_and(|(a, b)| a >= b),
        ConditionOperator::Lt => numbers(resolved, expected).is_some_and(|(a, b)| a < b),
        ConditionOperator::Lte => numbers(resolved, expected).is_some_and(|(a, b)| a <= b),
        ConditionOperator::In => match expected {
            Value::Array(items) => resolved.is_some_and(|v| member(v, items)),
            _ => false,
        },
        ConditionOperator::Nin => match expected {
            Value::Array(items) => !resolved.is_some_and(|v| member(v, items)),
            _ => false,
        },
        ConditionOperator::Contains => match (resolved.and_then(Value::as_str), needle(expected)) {
            (Some(haystack), Some(needle)) => haystack.contains(needle.as_str()),
            _ => false,
        },
        ConditionOperator::Matches => {
            match (resolved.and_then(Value::as_str), expected.as_str()) {
                (Some(subject), Some(pattern)) => regex_matches(pattern, subject),
                _ => false,
            }
        }
        ConditionOperator::Exists => resolved.is_some_and(|v| !v.is_null()),
    };

    trace!(
        field = %condition.field,
        %operator,
        result,
        "condition evaluated"
    );
    result
}

/// Strict equality; numbers compare by value so `1` equals `1.0`.
fn strict_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn member(value: &Value, items: &[Value]) -> bool {
    items.iter().any(|item| strict_eq(value, item))
}

fn numbers(actual: Option<&Value>, expected: &Value) -> Option<(f64, f64)> {
    Some((actual?.as_f64()?, expected.as_f64()?))
}

/// Substring operand for `contains`: strings as-is, numbers and booleans as text.
fn needle(expected: &Value) -> Option<String> {
    match expected {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Compiled fresh on every call; an invalid pattern never matches.
fn regex_matches(pattern: &str, subject: &str) -> bool {
    match RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
    {
        Ok(re) => re.is_match(subject),
        Err(err) => {
            debug!(pattern, %err, "invalid pattern in matches condition");
            false
        }
    }
}
