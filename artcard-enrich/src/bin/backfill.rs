//! artcard-backfill - add MusicBrainz data to existing artist cards
//!
//! Walks the cards folder, matches each card's title against MusicBrainz
//! (genres as hints) and merges what it finds without overwriting anything
//! the card already has.

use anyhow::Result;
use artcard_common::config::get_user_agent;
use artcard_enrich::cli::{print_summary, require_cards_dir, CommonArgs};
use artcard_enrich::services::{CardStore, EncyclopediaMatcher, MusicBrainzClient};
use artcard_enrich::workflow::{shutdown_signal, BackfillOptions, BackfillWorkflow};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments for artcard-backfill
#[derive(Parser, Debug)]
#[command(name = "artcard-backfill")]
#[command(about = "Backfill MusicBrainz data into existing artist cards")]
#[command(version)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let startup = args.common.startup("artcard-backfill")?;
    require_cards_dir(&startup)?;

    let matcher = EncyclopediaMatcher::new(Arc::new(MusicBrainzClient::new(
        &get_user_agent(),
        startup.config.rate_limits.encyclopedia_ms,
    )?));
    let mut workflow = BackfillWorkflow::new(
        matcher,
        CardStore::new(startup.cards_dir.clone(), args.common.dry_run),
        BackfillOptions {
            force: args.common.force,
            limit: args.common.limit,
        },
    );

    let interrupted = tokio::select! {
        result = workflow.run() => {
            result?;
            false
        },
        _ = shutdown_signal() => true,
    };

    print_summary(&workflow.statistics().summary_lines());

    if interrupted {
        warn!("Interrupted; cards written so far are complete");
        anyhow::bail!("Run interrupted");
    }
    info!("Backfill complete: {}", workflow.statistics().display_string());
    Ok(())
}
