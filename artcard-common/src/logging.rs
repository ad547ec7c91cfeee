//! Tracing subscriber initialisation shared by all binaries

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives in priority order: CLI level, then `RUST_LOG`, then the
/// config file level
pub fn filter_directives(cli_level: Option<&str>, env_filter: Option<&str>, config_level: &str) -> String {
    let level_directives =
        |level: &str| format!("{},hyper=warn,reqwest=warn", level.trim().to_lowercase());

    match (cli_level, env_filter.filter(|f| !f.trim().is_empty())) {
        (Some(level), _) => level_directives(level),
        (None, Some(env)) => env.to_string(),
        (None, None) => level_directives(config_level),
    }
}

/// Initialise the global tracing subscriber
///
/// An explicit `--log-level` wins over `RUST_LOG`, which wins over the config
/// file. When `log_file` is given, events are also appended to that file
/// without ANSI colour codes.
pub fn init_tracing(cli_level: Option<&str>, config_level: &str, log_file: Option<&Path>) -> Result<()> {
    let env_filter = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(cli_level, env_filter.as_deref(), config_level);
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))?;

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialise tracing: {}", e)))
}
