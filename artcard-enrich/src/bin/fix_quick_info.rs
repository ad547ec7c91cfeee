//! artcard-fix-quick-info - make Quick-Info instrument lines match the front matter

use anyhow::Result;
use artcard_enrich::cli::{print_summary, require_cards_dir, CommonArgs};
use artcard_enrich::services::CardStore;
use artcard_enrich::workflow::{QuickInfoFix, QuickInfoOptions};
use clap::Parser;
use tracing::info;

/// Command-line arguments for artcard-fix-quick-info
#[derive(Parser, Debug)]
#[command(name = "artcard-fix-quick-info")]
#[command(about = "Sync Quick Info instrument lines with card front matter")]
#[command(version)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let startup = args.common.startup("artcard-fix-quick-info")?;
    require_cards_dir(&startup)?;

    let mut fix = QuickInfoFix::new(
        CardStore::new(startup.cards_dir.clone(), args.common.dry_run),
        QuickInfoOptions {
            force: args.common.force,
            limit: args.common.limit,
        },
    );
    let stats = fix.run()?;

    print_summary(&stats.summary_lines());
    info!("Quick Info sync complete: {}", stats.display_string());
    Ok(())
}
