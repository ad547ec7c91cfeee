//! Command-line options shared by every binary, and the common startup
//! sequence (config file → logging → cards folder)

use anyhow::{Context, Result};
use artcard_common::config::{
    load_toml_config, resolve_folder, CompiledDefaults, TomlConfig, ENV_CARDS_DIR,
};
use artcard_common::logging::init_tracing;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Bypass the skip checks (re-process cards that look done)
    #[arg(long)]
    pub force: bool,

    /// Folder holding the artist cards
    #[arg(long, value_name = "DIR")]
    pub cards_dir: Option<PathBuf>,

    /// Process only the first N items
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Config file (default: ~/.config/artcard/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Resolved settings every binary starts from
#[derive(Debug)]
pub struct Startup {
    pub config: TomlConfig,
    pub defaults: CompiledDefaults,
    pub cards_dir: PathBuf,
}

impl CommonArgs {
    /// Load the config file, initialise logging and resolve the cards folder
    pub fn startup(&self, binary: &str) -> Result<Startup> {
        let config = load_toml_config(self.config.as_deref())?;
        let defaults = CompiledDefaults::for_current_platform();

        init_tracing(
            self.log_level.as_deref(),
            &config.logging.level,
            config.logging.file.as_deref(),
        )?;

        let cards_dir = resolve_folder(
            self.cards_dir.as_deref(),
            ENV_CARDS_DIR,
            config.cards_dir.as_deref(),
            defaults.cards_dir.clone(),
        );

        info!("Starting {} v{}", binary, env!("CARGO_PKG_VERSION"));
        info!("Cards folder: {}", cards_dir.display());
        if self.dry_run {
            info!("DRY RUN - no files will be modified");
        }
        if self.force {
            info!("FORCE - skip checks are bypassed");
        }

        Ok(Startup {
            config,
            defaults,
            cards_dir,
        })
    }
}

/// Fail unless the cards folder exists (maintenance utilities)
pub fn require_cards_dir(startup: &Startup) -> Result<()> {
    if !startup.cards_dir.is_dir() {
        anyhow::bail!(
            "Cards directory does not exist: {}",
            startup.cards_dir.display()
        );
    }
    Ok(())
}

/// Create the cards folder for a live run (dry runs never touch the disk)
pub fn ensure_cards_dir(startup: &Startup, dry_run: bool) -> Result<()> {
    if !dry_run {
        std::fs::create_dir_all(&startup.cards_dir).with_context(|| {
            format!(
                "Failed to create cards directory {}",
                startup.cards_dir.display()
            )
        })?;
    }
    Ok(())
}

/// Print end-of-run summary lines to stdout
pub fn print_summary(lines: &[String]) {
    println!();
    for line in lines {
        println!("{}", line);
    }
}
