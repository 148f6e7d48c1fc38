use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "policy-check")]
#[command(version)]
#[command(about = "Validate and evaluate policy DSL documents")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./policy-check.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a policy document for structural problems
    Validate {
        /// Policy document (.json, otherwise YAML)
        policy: PathBuf,
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Evaluate a policy document against a request context
    Eval {
        /// Policy document (.json, otherwise YAML)
        policy: PathBuf,
        /// Request context (.json, otherwise YAML); "-" reads JSON from stdin
        context: PathBuf,
        /// Audit timestamp to record (RFC 3339), defaults to now
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<DateTime<Utc>>,
    },

    /// Parse condition text and print the result as JSON
    Parse {
        /// Condition text, e.g. "actor.type == 'user' and action == 'read'"
        text: String,
        /// Parse a full boolean expression (or, not, parentheses)
        #[arg(long)]
        expr: bool,
    },

    /// Print the token stream of condition text
    Tokens {
        /// Condition text
        text: String,
    },

    /// Print a ready-made policy document as YAML
    New {
        /// Policy name
        name: String,
        #[arg(long, value_enum, default_value_t = PresetArg::Deny)]
        preset: PresetArg,
        /// Approvers required by the approval preset
        #[arg(long, default_value_t = 1)]
        min_approvers: u32,
    },
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab_case")]
pub enum PresetArg {
    Allow,
    Deny,
    Approval,
}
