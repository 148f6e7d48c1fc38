use std::fs::OpenOptions;
use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

use crate::settings::CheckSettings;

/// Env var naming a log file; takes precedence over `log_path` in settings.
pub const LOG_ENV: &str = "POLICY_CHECK_LOG";

pub fn init_tracing(settings: &CheckSettings, verbose: bool) {
    // Log path: POLICY_CHECK_LOG env var > settings.log_path > stderr.
    let log_path = std::env::var(LOG_ENV)
        .ok()
        .or_else(|| settings.log_path.clone());

    let log_file = log_path.as_deref().and_then(|path| {
        let path = std::path::Path::new(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let layer: Box<dyn Layer<_> + Send + Sync> = match log_file {
        Some(file) => tracing_subscriber::fmt::layer()
            .with_writer(file)
            .pretty()
            .with_ansi(false)
            .with_filter(LevelFilter::from_level(Level::DEBUG))
            .boxed(),
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_ansi(false)
            .with_filter(stderr_level(&settings.log_level, verbose))
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).init()
}

/// Level for the stderr fallback. Unknown names fall back to WARN.
fn stderr_level(configured: &str, verbose: bool) -> LevelFilter {
    let level = LevelFilter::from_str(configured).unwrap_or(LevelFilter::WARN);
    if verbose {
        level.max(LevelFilter::DEBUG)
    } else {
        level
    }
}
