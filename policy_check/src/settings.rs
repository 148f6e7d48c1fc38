//! Layered configuration for `policy-check`.
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. `policy-check.json` in the working directory, or the `--config` file
//! 3. `POLICY_CHECK_*` environment variables (`POLICY_CHECK_LOG_LEVEL=debug`)

use std::path::Path;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use tracing::{Level, instrument};

/// Settings file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "policy-check.json";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "POLICY_CHECK_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Write logs to this file at DEBUG instead of stderr.
    #[serde(default)]
    pub log_path: Option<String>,
    /// Stderr log level when no log file is configured.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `validate` fails on warnings too.
    #[serde(default)]
    pub fail_on_warnings: bool,
    /// Colored output. `NO_COLOR` disables it regardless.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_log_level() -> String {
    "warn".into()
}

fn default_color() -> bool {
    true
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: default_log_level(),
            fail_on_warnings: false,
            color: default_color(),
        }
    }
}

impl CheckSettings {
    /// The configured provider stack. An explicit `config` path must exist.
    #[instrument(level = Level::TRACE)]
    pub fn figment(config: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(CheckSettings::default()));

        match config {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                figment = figment.merge(Json::file(path));
            }
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    figment = figment.merge(Json::file(local));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load the effective settings.
    #[instrument(level = Level::TRACE)]
    pub fn load(config: Option<&Path>) -> Result<Self> {
        Self::figment(config)?
            .extract()
            .context("failed to load policy-check settings")
    }
}
