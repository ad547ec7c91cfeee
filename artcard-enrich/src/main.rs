//! artcard-discover - build researched artist cards from a playlist archive
//!
//! Reads every "Found" artist from the archive table and, one artist at a
//! time, gathers catalog, encyclopedia and research data into a card in the
//! cards folder. Cards already carrying the research flag are skipped, so a
//! re-run only pays for new artists.

use anyhow::{Context, Result};
use artcard_common::config::{
    get_user_agent, require_credential, resolve_folder, CONNECTIONS_FILE, ENV_IMAGES_DIR,
    ENV_PERPLEXITY_API_KEY, ENV_SPOTIFY_CLIENT_ID, ENV_SPOTIFY_CLIENT_SECRET,
};
use artcard_enrich::cli::{ensure_cards_dir, print_summary, CommonArgs};
use artcard_enrich::services::archive_parser::load_archive;
use artcard_enrich::services::{
    CardStore, CatalogSource, ConnectionsLedger, EncyclopediaMatcher, ImageStore,
    MusicBrainzClient, PerplexityClient, PlaceholderResearch, ResearchSource, SpotifyClient,
};
use artcard_enrich::workflow::{shutdown_signal, DiscoveryOptions, DiscoveryPipeline};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments for artcard-discover
#[derive(Parser, Debug)]
#[command(name = "artcard-discover")]
#[command(about = "Build researched artist cards from a playlist archive")]
#[command(version)]
struct Args {
    /// Playlist archive (markdown table with a status column)
    #[arg(long, value_name = "FILE")]
    archive: PathBuf,

    /// Folder for downloaded artist portraits
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let startup = args.common.startup("artcard-discover")?;
    let config = &startup.config;
    let dry_run = args.common.dry_run;

    // Everything that can fail the whole run is checked before the first artist
    let artists = load_archive(&args.archive)
        .with_context(|| format!("Failed to load archive {}", args.archive.display()))?;
    info!("Archive: {} ({} found artists)", args.archive.display(), artists.len());

    let client_id = require_credential(
        "Spotify client id",
        ENV_SPOTIFY_CLIENT_ID,
        config.credentials.spotify_client_id.as_deref(),
    )?;
    let client_secret = require_credential(
        "Spotify client secret",
        ENV_SPOTIFY_CLIENT_SECRET,
        config.credentials.spotify_client_secret.as_deref(),
    )?;

    let research: Arc<dyn ResearchSource> = if dry_run {
        info!("Using placeholder research (dry run)");
        Arc::new(PlaceholderResearch)
    } else {
        let api_key = require_credential(
            "Perplexity API key",
            ENV_PERPLEXITY_API_KEY,
            config.credentials.perplexity_api_key.as_deref(),
        )?;
        Arc::new(PerplexityClient::new(
            api_key,
            config.research.clone(),
            config.rate_limits.research_ms,
        )?)
    };

    let spotify = SpotifyClient::new(client_id, client_secret, config.rate_limits.catalog_ms)?;
    spotify
        .verify_credentials()
        .await
        .context("Spotify authentication failed")?;
    let catalog: Arc<dyn CatalogSource> = Arc::new(spotify);
    let encyclopedia = EncyclopediaMatcher::new(Arc::new(MusicBrainzClient::new(
        &get_user_agent(),
        config.rate_limits.encyclopedia_ms,
    )?));

    ensure_cards_dir(&startup, dry_run)?;
    let ledger = ConnectionsLedger::load(&startup.cards_dir.join(CONNECTIONS_FILE))
        .context("Refusing to run with an unreadable connections ledger")?;

    let images_dir = resolve_folder(
        args.images_dir.as_deref(),
        ENV_IMAGES_DIR,
        config.images_dir.as_deref(),
        startup.defaults.images_dir.clone(),
    );
    let link_prefix = config
        .image_link_prefix
        .clone()
        .unwrap_or_else(|| startup.defaults.image_link_prefix.clone());
    info!("Images folder: {}", images_dir.display());
    let images = ImageStore::new(images_dir, link_prefix, dry_run)?;

    let options = DiscoveryOptions {
        dry_run,
        force: args.common.force,
        limit: args.common.limit,
    };
    let mut pipeline = DiscoveryPipeline::new(
        catalog,
        encyclopedia,
        research,
        CardStore::new(startup.cards_dir.clone(), dry_run),
        ledger,
        options,
    )
    .with_images(images);

    let interrupted = tokio::select! {
        _ = pipeline.process_archive(&artists) => false,
        _ = shutdown_signal() => true,
    };

    if interrupted {
        warn!(
            "Interrupted after {} artists, saving progress",
            pipeline.statistics().processed
        );
    }
    pipeline
        .save_ledger()
        .context("Failed to save connections ledger")?;

    print_summary(&pipeline.summary_lines());

    if interrupted {
        anyhow::bail!("Run interrupted");
    }
    info!("Discovery complete: {}", pipeline.statistics().display_string());
    Ok(())
}
