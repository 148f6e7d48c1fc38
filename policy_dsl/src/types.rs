//! Policy documents, evaluation contexts and results.
//!
//! Everything here is plain data with serde support, so a loader can read
//! documents from YAML or JSON and an audit sink can persist results. Wire names
//! are camelCase (`defaultAction`, `matchedRuleId`, `ipAddress`, ...), which is
//! also what dotted field paths in conditions refer to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::parse::parse_conditions;

/// A free-form string-keyed map (attributes, metadata, variables).
pub type Attributes = Map<String, Value>;

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    Matches,
    Exists,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Eq => "eq",
            ConditionOperator::Ne => "ne",
            ConditionOperator::Gt => "gt",
            ConditionOperator::Gte => "gte",
            ConditionOperator::Lt => "lt",
            ConditionOperator::Lte => "lte",
            ConditionOperator::In => "in",
            ConditionOperator::Nin => "nin",
            ConditionOperator::Contains => "contains",
            ConditionOperator::Matches => "matches",
            ConditionOperator::Exists => "exists",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic test of one context field against a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCondition {
    /// Dotted path into the context, e.g. `resource.attributes.owner`.
    #[serde(default)]
    pub field: String,

    /// `None` only when a loaded document omitted it; such a condition never matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl PolicyCondition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator),
            value: value.into(),
        }
    }

    /// A value-less `field exists` condition.
    pub fn exists(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: Some(ConditionOperator::Exists),
            value: Value::Null,
        }
    }
}

impl fmt::Display for PolicyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator.map_or("?", |op| op.as_str());
        if self.value.is_null() {
            write!(f, "{} {}", self.field, op)
        } else {
            write!(f, "{} {} {}", self.field, op, self.value)
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What happens when a rule (or the default) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Allow,
    Deny,
    RequireApproval,
    Notify,
    Audit,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Allow => write!(f, "allow"),
            ActionType::Deny => write!(f, "deny"),
            ActionType::RequireApproval => write!(f, "require_approval"),
            ActionType::Notify => write!(f, "notify"),
            ActionType::Audit => write!(f, "audit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalConfig {
    pub min_approvers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_hours: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DslPolicyAction {
    /// `None` only when a loaded document omitted it; never counts as allowed.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,
}

impl DslPolicyAction {
    pub fn new(kind: ActionType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn allow() -> Self {
        Self::new(ActionType::Allow)
    }

    pub fn deny() -> Self {
        Self::new(ActionType::Deny)
    }

    pub fn require_approval(min_approvers: u32) -> Self {
        Self {
            approval: Some(ApprovalConfig {
                min_approvers,
                required_roles: None,
                timeout_hours: None,
            }),
            ..Self::new(ActionType::RequireApproval)
        }
    }

    pub fn is_allow(&self) -> bool {
        self.kind == Some(ActionType::Allow)
    }
}

// ---------------------------------------------------------------------------
// Rules and documents
// ---------------------------------------------------------------------------

/// Boolean combinator of a nested rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedOperator {
    And,
    Or,
    /// Negates the first rule of the group only.
    Not,
}

impl fmt::Display for NestedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestedOperator::And => write!(f, "and"),
            NestedOperator::Or => write!(f, "or"),
            NestedOperator::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedRules {
    pub operator: NestedOperator,
    #[serde(default)]
    pub rules: Vec<DslPolicyRule>,
}

/// A named, prioritized rule.
///
/// `conditions` accepts a list of condition objects, a list of DSL strings, or
/// a single DSL string (`"actor.type == 'user' and action == 'deploy'"`) when
/// deserialized. A DSL string that does not parse rejects the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslPolicyRule {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "deserialize_conditions")]
    pub conditions: Vec<PolicyCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedRules>,

    #[serde(default)]
    pub action: DslPolicyAction,

    /// Lower values are evaluated first.
    #[serde(default)]
    pub priority: i64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl DslPolicyRule {
    /// An enabled rule with priority 0 and no conditions.
    pub fn new(id: impl Into<String>, name: impl Into<String>, action: DslPolicyAction) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            conditions: Vec::new(),
            nested: None,
            action,
            priority: 0,
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_condition(mut self, condition: PolicyCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = PolicyCondition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn with_nested(mut self, operator: NestedOperator, rules: Vec<DslPolicyRule>) -> Self {
        self.nested = Some(NestedRules { operator, rules });
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// The unit of validation and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DslPolicyDocument {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub default_action: DslPolicyAction,

    #[serde(default)]
    pub rules: Vec<DslPolicyRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Attributes>,
}

impl DslPolicyDocument {
    pub fn new(
        version: impl Into<String>,
        name: impl Into<String>,
        default_action: DslPolicyAction,
    ) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            description: None,
            default_action,
            rules: Vec::new(),
            variables: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_rule(mut self, rule: DslPolicyRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Deserialize conditions from a DSL string, a list of DSL strings and/or
/// condition objects, or null.
fn deserialize_conditions<'de, D>(deserializer: D) -> Result<Vec<PolicyCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let parse_dsl = |text: &str| -> Result<Vec<PolicyCondition>, D::Error> {
        parse_conditions(text)
            .map_err(|e| D::Error::custom(format!("invalid condition '{}': {}", text, e)))
    };

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => parse_dsl(&text),
        Value::Array(items) => {
            let mut conditions = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(text) => conditions.extend(parse_dsl(&text)?),
                    obj @ Value::Object(_) => {
                        conditions.push(serde_json::from_value(obj).map_err(D::Error::custom)?)
                    }
                    other => {
                        return Err(D::Error::custom(format!(
                            "condition must be a string or an object, got {}",
                            other
                        )));
                    }
                }
            }
            Ok(conditions)
        }
        other => Err(D::Error::custom(format!(
            "conditions must be a string or a sequence, got {}",
            other
        ))),
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    User,
    System,
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl Actor {
    pub fn new(id: impl Into<String>, kind: ActorType) -> Self {
        Self {
            id: id.into(),
            kind,
            roles: None,
            attributes: None,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(id, ActorType::User)
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// The runtime facts a policy is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DslPolicyContext {
    pub actor: Actor,
    pub action: String,
    pub resource: Resource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Attributes>,
}

impl DslPolicyContext {
    pub fn new(actor: Actor, action: impl Into<String>, resource: Resource) -> Self {
        Self {
            actor,
            action: action.into(),
            resource,
            environment: None,
            custom: None,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Structured record of one evaluation, ready to hand to an audit sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAudit {
    pub timestamp: DateTime<Utc>,
    pub policy_version: String,
    /// Rules inspected, counting the matched one (1-based position in priority order).
    pub evaluated_rules: usize,
    pub context: DslPolicyContext,
}

/// The decision produced by [`crate::evaluate_policy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DslPolicyResult {
    pub allowed: bool,
    pub action: DslPolicyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
    pub reasons: Vec<String>,
    pub audit: PolicyAudit,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One finding of [`crate::validate_policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location inside the document, e.g. `rules[2].conditions[0].field`.
    pub path: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}
