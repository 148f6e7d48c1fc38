//! Canned policy documents with a single default action and no rules.
//!
//! Useful as a starting point for authoring tools, and as the "no policy
//! configured" fallback of an execution gate.

use crate::types::{DslPolicyAction, DslPolicyDocument};

/// Version stamped on every preset document.
pub const PRESET_VERSION: &str = "1.0";

/// A document that allows everything.
pub fn create_allow_policy(name: impl Into<String>) -> DslPolicyDocument {
    DslPolicyDocument::new(PRESET_VERSION, name, DslPolicyAction::allow())
        .with_description("Allow all actions")
}

/// A document that denies everything.
pub fn create_deny_policy(name: impl Into<String>) -> DslPolicyDocument {
    DslPolicyDocument::new(PRESET_VERSION, name, DslPolicyAction::deny())
        .with_description("Deny all actions")
}

/// A document that routes everything to human approval.
pub fn create_approval_policy(name: impl Into<String>, min_approvers: u32) -> DslPolicyDocument {
    DslPolicyDocument::new(
        PRESET_VERSION,
        name,
        DslPolicyAction::require_approval(min_approvers.max(1)),
    )
    .with_description("Require approval for all actions")
}
