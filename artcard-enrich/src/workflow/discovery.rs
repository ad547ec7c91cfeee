//! Discovery pipeline: archive artists → enriched cards
//!
//! Per artist, sequentially:
//! 1. Classify the existing card (absent / variant / enhanced / needs work)
//! 2. Catalog lookup (required)
//! 3. Encyclopedia match (optional, failures only lose that data)
//! 4. Research (required)
//! 5. Collaborator merge, portrait, card build, write
//! 6. Ledger update
//!
//! A failure aborts only the current artist. The enhancement flag on an
//! existing card is checked before any network traffic.

use crate::error::{EnrichError, EnrichResult};
use crate::models::{CatalogMetadata, EncyclopediaMatch, ResearchResult};
use crate::services::card_builder::{self, CardInputs};
use crate::services::card_store::is_enhanced;
use crate::services::{
    CardLookup, CardStore, CatalogSource, ConnectionsLedger, EncyclopediaMatcher, ImageStore,
    ResearchSource,
};
use crate::workflow::statistics::RunStatistics;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Run-wide switches
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Fetch and build, but write nothing
    pub dry_run: bool,
    /// Re-process enhanced cards and variants
    pub force: bool,
    /// Process only the first N archive artists
    pub limit: Option<usize>,
}

/// Existing-card state of an artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistState {
    /// No card yet
    NotFound,
    /// Only a case/punctuation variant card exists
    Duplicate(PathBuf),
    /// Card carries the research enhancement flag
    AlreadyEnhanced(PathBuf),
    /// Card exists without the enhancement flag
    NeedsEnhancement(PathBuf),
}

/// Result of processing one artist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtistOutcome {
    Created { connections: usize },
    Enhanced { connections: usize },
    SkippedEnhanced,
    SkippedDuplicate { card: String },
    Failed { reason: String },
}

impl ArtistOutcome {
    /// One-line status for progress output
    pub fn status_line(&self) -> String {
        match self {
            ArtistOutcome::Created { connections } => {
                format!("Created ({} connections)", connections)
            }
            ArtistOutcome::Enhanced { connections } => {
                format!("Enhanced ({} connections)", connections)
            }
            ArtistOutcome::SkippedEnhanced => "Already enhanced".to_string(),
            ArtistOutcome::SkippedDuplicate { card } => format!("Duplicate: {}", card),
            ArtistOutcome::Failed { reason } => format!("Error: {}", reason),
        }
    }
}

/// Sources and stores used by a discovery run
pub struct DiscoveryPipeline {
    catalog: Arc<dyn CatalogSource>,
    encyclopedia: EncyclopediaMatcher,
    research: Arc<dyn ResearchSource>,
    cards: CardStore,
    images: Option<ImageStore>,
    ledger: ConnectionsLedger,
    options: DiscoveryOptions,
    stats: RunStatistics,
}

impl DiscoveryPipeline {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        encyclopedia: EncyclopediaMatcher,
        research: Arc<dyn ResearchSource>,
        cards: CardStore,
        ledger: ConnectionsLedger,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            catalog,
            encyclopedia,
            research,
            cards,
            images: None,
            ledger,
            options,
            stats: RunStatistics::default(),
        }
    }

    /// Download portraits into this store (without one, cards carry no image)
    pub fn with_images(mut self, images: ImageStore) -> Self {
        self.images = Some(images);
        self
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn ledger(&self) -> &ConnectionsLedger {
        &self.ledger
    }

    /// Existing-card state for `artist`
    pub fn classify(&self, artist: &str) -> EnrichResult<ArtistState> {
        Ok(match self.cards.find_existing(artist)? {
            CardLookup::Absent => ArtistState::NotFound,
            CardLookup::Variant(path) => ArtistState::Duplicate(path),
            CardLookup::Exact(path) => {
                if self.cards.has_enhancement(&path) {
                    ArtistState::AlreadyEnhanced(path)
                } else {
                    ArtistState::NeedsEnhancement(path)
                }
            }
        })
    }

    /// Process every artist (up to the configured limit), in order
    pub async fn process_archive(&mut self, artists: &[String]) -> &RunStatistics {
        let selected = match self.options.limit {
            Some(limit) => &artists[..limit.min(artists.len())],
            None => artists,
        };
        self.stats.total = selected.len();

        info!(
            artists = selected.len(),
            dry_run = self.options.dry_run,
            force = self.options.force,
            "Starting discovery run"
        );

        for (index, artist) in selected.iter().enumerate() {
            let outcome = self.process_artist(artist).await;
            info!(
                progress = format!("{}/{}", index + 1, selected.len()),
                artist = %artist,
                status = %outcome.status_line()
            );
        }

        &self.stats
    }

    /// Process one artist; never fails the run
    pub async fn process_artist(&mut self, artist: &str) -> ArtistOutcome {
        info!(artist = %artist, "Processing");
        let outcome = self.process_artist_inner(artist).await;
        self.stats.processed += 1;

        match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(artist = %artist, error = %e, "Failed to process artist");
                self.stats.errors += 1;
                ArtistOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn process_artist_inner(&mut self, artist: &str) -> EnrichResult<ArtistOutcome> {
        let state = self.classify(artist)?;

        let existing = match state {
            ArtistState::Duplicate(path) if !self.options.force => {
                info!(artist = %artist, card = %path.display(), "Skipping: variant card exists");
                self.stats.skipped_duplicate += 1;
                return Ok(ArtistOutcome::SkippedDuplicate {
                    card: file_name(&path),
                });
            }
            ArtistState::AlreadyEnhanced(_) if !self.options.force => {
                info!(artist = %artist, "Skipping: already enhanced");
                self.stats.skipped_enhanced += 1;
                return Ok(ArtistOutcome::SkippedEnhanced);
            }
            ArtistState::NotFound => None,
            ArtistState::Duplicate(path)
            | ArtistState::AlreadyEnhanced(path)
            | ArtistState::NeedsEnhancement(path) => Some(path),
        };

        let catalog = self
            .catalog
            .lookup_artist(artist)
            .await?
            .ok_or_else(|| EnrichError::NotFound(format!("No catalog artist for '{}'", artist)))?;

        let encyclopedia = self.encyclopedia_match(artist, &catalog).await;

        let mut research = self.research.research(artist, &catalog).await?;
        let encyclopedia_collaborators = encyclopedia
            .as_ref()
            .map(|m| m.collaborators.as_slice())
            .unwrap_or_default();
        research.connections.collaborators = card_builder::merge_collaborators(
            &research.connections.collaborators,
            encyclopedia_collaborators,
        );

        let image_link = self.portrait(artist, &catalog).await;
        let card_path = existing
            .clone()
            .unwrap_or_else(|| self.cards.card_path(artist));
        let entry_created = existing
            .as_deref()
            .and_then(|path| self.previous_entry_created(path));

        let now = Utc::now();
        let card = card_builder::build_card(&CardInputs {
            artist_name: artist,
            catalog: &catalog,
            encyclopedia: encyclopedia.as_ref(),
            research: &research,
            image_link: image_link.as_deref(),
            entry_created,
            now,
        })?;
        self.cards.write_document(&card_path, &card)?;

        let connections = self.record_connections(artist, &research, now);
        if existing.is_some() {
            self.stats.enhanced += 1;
            Ok(ArtistOutcome::Enhanced { connections })
        } else {
            self.stats.created += 1;
            Ok(ArtistOutcome::Created { connections })
        }
    }

    async fn encyclopedia_match(
        &self,
        artist: &str,
        catalog: &CatalogMetadata,
    ) -> Option<EncyclopediaMatch> {
        match self.encyclopedia.fetch_match(artist, &catalog.genres).await {
            Ok(found) => Some(found),
            Err(e) if e.is_no_match() => {
                info!(artist = %artist, reason = %e, "Continuing without encyclopedia data");
                None
            }
            Err(e) => {
                warn!(artist = %artist, error = %e, "Encyclopedia lookup failed, continuing without it");
                None
            }
        }
    }

    async fn portrait(&self, artist: &str, catalog: &CatalogMetadata) -> Option<String> {
        let (store, url) = match (&self.images, &catalog.image_url) {
            (Some(store), Some(url)) => (store, url),
            _ => {
                debug!(artist = %artist, "No portrait available");
                return None;
            }
        };

        match store.ensure_portrait(artist, url).await {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(artist = %artist, error = %e, "No image downloaded");
                None
            }
        }
    }

    fn previous_entry_created(&self, path: &Path) -> Option<String> {
        let document = self.cards.read(path).ok()?;
        if is_enhanced(&document) {
            debug!(card = %path.display(), "Re-building an enhanced card");
        }
        document.get_str("entry_created").map(str::to_string)
    }

    fn record_connections(
        &mut self,
        artist: &str,
        research: &ResearchResult,
        now: chrono::DateTime<Utc>,
    ) -> usize {
        let count = self.ledger.record(
            artist,
            &research.connections,
            card_builder::timestamp(now),
        );
        self.stats.connections_found += count;
        count
    }

    /// Persist the ledger (no-op in dry-run mode)
    pub fn save_ledger(&self) -> EnrichResult<bool> {
        self.ledger.save(self.options.dry_run)
    }

    /// Summary lines for the end of the run
    pub fn summary_lines(&self) -> Vec<String> {
        self.stats.summary_lines(self.ledger.len())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
