//! Policy DSL engine: lex, parse, and evaluate textual governance rules.
//!
//! A policy document is an ordered set of prioritized rules plus a default
//! action. Each rule combines conditions of the form `field operator value`
//! (optionally with nested `and`/`or`/`not` groups) with an action such as
//! `allow`, `deny` or `require_approval`. Evaluating a document against a
//! runtime context yields a [`DslPolicyResult`] with the decision, the reason
//! and an audit record.
//!
//! The engine does no I/O and keeps no state between calls. It computes
//! decisions; enforcing them, loading documents and persisting audit records
//! belong to the caller.
//!
//! # Modules
//!
//! - [`lexer`]: DSL text to tokens.
//! - [`parse`]: tokens to single conditions, and flat `and` lists.
//! - [`expr`]: full boolean expressions with `or`, `not` and parentheses.
//! - [`condition`]: one condition against a context.
//! - [`rule`]: one rule (conditions + nested groups) against a context.
//! - [`eval`]: a whole document, first match wins, default fallback.
//! - [`validate`]: static structural checks.
//! - [`presets`]: ready-made allow / deny / approval documents.
//!
//! # Example
//!
//! ```
//! use policy_dsl::{
//!     Actor, DslPolicyAction, DslPolicyContext, DslPolicyDocument, DslPolicyRule, Resource,
//!     evaluate_policy, parse_conditions, validate_policy,
//! };
//!
//! let rule = DslPolicyRule::new("admins", "Admins may delete", DslPolicyAction::allow())
//!     .with_conditions(parse_conditions("action == 'delete' and actor.roles.0 == 'admin'").unwrap())
//!     .with_priority(10);
//! let doc = DslPolicyDocument::new("1.0", "deletes", DslPolicyAction::deny()).with_rule(rule);
//! assert!(validate_policy(&doc).iter().all(|issue| !issue.is_error()));
//!
//! let ctx = DslPolicyContext::new(
//!     Actor::user("alice").with_roles(["admin"]),
//!     "delete",
//!     Resource::new("database"),
//! );
//! let result = evaluate_policy(&doc, &ctx);
//! assert!(result.allowed);
//! assert_eq!(result.matched_rule_id.as_deref(), Some("admins"));
//! ```

pub mod condition;
pub mod error;
pub mod eval;
pub mod expr;
pub mod lexer;
pub mod parse;
pub mod presets;
pub mod rule;
pub mod types;
pub mod validate;

pub use condition::{evaluate_condition, resolve_field};
pub use error::PolicyParseError;
pub use eval::{evaluate_policy, evaluate_policy_at};
pub use expr::{ConditionExpr, evaluate_expression, parse_expression};
pub use lexer::{LogicalOperator, Token, TokenKind, tokenize};
pub use parse::{parse_condition, parse_conditions};
pub use presets::{create_allow_policy, create_approval_policy, create_deny_policy};
pub use rule::evaluate_rule;
pub use types::*;
pub use validate::validate_policy;
