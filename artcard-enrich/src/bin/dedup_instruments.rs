//! artcard-dedup-instruments - remove repeated entries from card instrument lists

use anyhow::Result;
use artcard_enrich::cli::{print_summary, require_cards_dir, CommonArgs};
use artcard_enrich::services::CardStore;
use artcard_enrich::workflow::{DedupOptions, InstrumentDedup};
use clap::Parser;
use tracing::info;

/// Command-line arguments for artcard-dedup-instruments
#[derive(Parser, Debug)]
#[command(name = "artcard-dedup-instruments")]
#[command(about = "Deduplicate instrument lists in artist cards")]
#[command(version)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let startup = args.common.startup("artcard-dedup-instruments")?;
    require_cards_dir(&startup)?;

    let mut dedup = InstrumentDedup::new(
        CardStore::new(startup.cards_dir.clone(), args.common.dry_run),
        DedupOptions {
            force: args.common.force,
            limit: args.common.limit,
        },
    );
    let stats = dedup.run()?;

    print_summary(&stats.summary_lines());
    info!("Dedup complete: {}", stats.display_string());
    Ok(())
}
