use std::process::ExitCode;

use clap::Parser;
use policy_check::cli::Cli;
use policy_check::errors::display_error;
use policy_check::settings::CheckSettings;
use policy_check::tracing_init::init_tracing;
use policy_check::{cmd, exit_code, style};
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match CheckSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            display_error(&e, cli.verbose);
            return ExitCode::from(exit_code::FAILURE);
        }
    };
    init_tracing(&settings, cli.verbose);
    if !settings.color {
        style::set_colors(false);
    }
    debug!(args = ?std::env::args().collect::<Vec<_>>(), ?settings, "policy-check started");

    match cmd::run(cli.command, &settings) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            debug!(error = %format!("{e:#}"), "command failed");
            display_error(&e, cli.verbose);
            ExitCode::from(exit_code::FAILURE)
        }
    }
}
