//! TTY-aware color helpers for human-facing output.
//!
//! Built on [`console`], which detects whether stdout/stderr is a terminal and
//! honors `NO_COLOR`. [`set_colors`] applies the `color` setting on top.

use console::Style;
use policy_dsl::{ActionType, Severity};

/// Globally enable or disable colors on both streams.
pub fn set_colors(enabled: bool) {
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

fn out() -> Style {
    Style::new()
}

fn err() -> Style {
    Style::new().for_stderr()
}

// ---------------------------------------------------------------------------
// stdout
// ---------------------------------------------------------------------------

pub fn bold(text: &str) -> String {
    out().bold().apply_to(text).to_string()
}

pub fn dim(text: &str) -> String {
    out().dim().apply_to(text).to_string()
}

pub fn cyan(text: &str) -> String {
    out().cyan().apply_to(text).to_string()
}

pub fn red_bold(text: &str) -> String {
    out().red().bold().apply_to(text).to_string()
}

pub fn yellow_bold(text: &str) -> String {
    out().yellow().bold().apply_to(text).to_string()
}

pub fn green(text: &str) -> String {
    out().green().apply_to(text).to_string()
}

// ---------------------------------------------------------------------------
// stderr
// ---------------------------------------------------------------------------

pub fn err_red_bold(text: &str) -> String {
    err().red().bold().apply_to(text).to_string()
}

pub fn err_green_bold(text: &str) -> String {
    err().green().bold().apply_to(text).to_string()
}

pub fn err_yellow_bold(text: &str) -> String {
    err().yellow().bold().apply_to(text).to_string()
}

pub fn err_dim(text: &str) -> String {
    err().dim().apply_to(text).to_string()
}

/// Bold cyan on stderr (hints).
pub fn err_cyan_bold(text: &str) -> String {
    err().cyan().bold().apply_to(text).to_string()
}

// ---------------------------------------------------------------------------
// Semantic
// ---------------------------------------------------------------------------

/// Label for a validation finding.
pub fn severity(severity: Severity) -> String {
    match severity {
        Severity::Error => red_bold("error"),
        Severity::Warning => yellow_bold("warning"),
    }
}

/// Label for a decided action, on stderr. A missing type reads as "none".
pub fn action(kind: Option<ActionType>) -> String {
    match kind {
        Some(ActionType::Allow) => err_green_bold("allow"),
        Some(ActionType::Deny) => err_red_bold("deny"),
        Some(ActionType::RequireApproval) => err_yellow_bold("require_approval"),
        Some(ActionType::Notify) => err_cyan_bold("notify"),
        Some(ActionType::Audit) => err_cyan_bold("audit"),
        None => err_dim("none"),
    }
}
