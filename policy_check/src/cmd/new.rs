use anyhow::{Context, Result};
use policy_dsl::{
    DslPolicyDocument, create_allow_policy, create_approval_policy, create_deny_policy,
};

use crate::cli::PresetArg;
use crate::exit_code;

/// Print a preset document as YAML, ready to be edited and saved.
pub fn run(name: &str, preset: PresetArg, min_approvers: u32) -> Result<u8> {
    let yaml = serde_yaml::to_string(&preset_document(name, preset, min_approvers))
        .context("failed to render policy document")?;
    print!("{yaml}");
    Ok(exit_code::SUCCESS)
}

fn preset_document(name: &str, preset: PresetArg, min_approvers: u32) -> DslPolicyDocument {
    match preset {
        PresetArg::Allow => create_allow_policy(name),
        PresetArg::Deny => create_deny_policy(name),
        PresetArg::Approval => create_approval_policy(name, min_approvers),
    }
}
