//! Subcommand implementations. Each `run` returns the process exit code.

pub mod eval;
pub mod inspect;
pub mod new;
pub mod validate;

use anyhow::Result;

use crate::cli::Commands;
use crate::settings::CheckSettings;

/// Dispatch a parsed command.
pub fn run(command: Commands, settings: &CheckSettings) -> Result<u8> {
    match command {
        Commands::Validate { policy, strict } => {
            validate::run(&policy, strict || settings.fail_on_warnings)
        }
        Commands::Eval {
            policy,
            context,
            at,
        } => eval::run(&policy, &context, at),
        Commands::Parse { text, expr } => inspect::parse(&text, expr),
        Commands::Tokens { text } => inspect::tokens(&text),
        Commands::New {
            name,
            preset,
            min_approvers,
        } => new::run(&name, preset, min_approvers),
    }
}
