//! `policy-check`: validate and evaluate policy DSL documents from a shell.
//!
//! The binary is a thin wrapper over [`policy_dsl`]. It loads documents and
//! contexts from YAML or JSON files, runs the engine and renders the outcome
//! for humans (stderr) and scripts (stdout, exit code).
//!
//! # Modules
//!
//! - [`cli`]: clap argument definitions.
//! - [`cmd`]: one module per subcommand.
//! - [`load`]: reading documents and contexts from disk.
//! - [`settings`]: layered configuration (defaults, file, environment).
//! - [`errors`]: user-facing error rendering with hints.
//! - [`style`]: TTY-aware colors.
//! - [`tracing_init`]: log subscriber setup.

pub mod cli;
pub mod cmd;
pub mod errors;
pub mod load;
pub mod settings;
pub mod style;
pub mod tracing_init;

/// Process exit codes.
pub mod exit_code {
    /// Command succeeded; for `eval`, the request is allowed.
    pub const SUCCESS: u8 = 0;
    /// Command could not run, or validation found problems.
    pub const FAILURE: u8 = 1;
    /// `eval` only: the request is not allowed (denied, needs approval, or the
    /// policy was refused).
    pub const NOT_ALLOWED: u8 = 2;
}
