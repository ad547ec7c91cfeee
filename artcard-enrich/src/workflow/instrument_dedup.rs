//! Instrument list deduplication
//!
//! Older cards were written with repeated entries in `instruments` (and the
//! matching Quick-Info line). This pass keeps the first occurrence of each
//! instrument and rewrites both places.

use crate::error::EnrichResult;
use crate::services::CardStore;
use crate::workflow::quick_info_fix::sync_quick_info_instruments;
use crate::workflow::statistics::DedupStats;
use artcard_common::CardDocument;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info};

/// Deduplicate keeping first occurrences; returns the list and the number removed
pub fn dedupe_list(items: &[String]) -> (Vec<String>, usize) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.as_str()) {
            unique.push(item.clone());
        }
    }
    let removed = items.len() - unique.len();
    (unique, removed)
}

/// Deduplicate a card's `instruments` in place (front matter and Quick Info)
///
/// Returns the number of duplicates removed; zero leaves the card untouched
/// unless `force` is set, in which case the Quick-Info line is still synced.
pub fn dedupe_instruments(document: &mut CardDocument, force: bool) -> EnrichResult<usize> {
    let instruments = match document.get_str_list("instruments") {
        Some(instruments) if !instruments.is_empty() => instruments,
        _ => return Ok(0),
    };

    let (unique, removed) = dedupe_list(&instruments);
    if removed == 0 && !force {
        return Ok(0);
    }

    document.set("instruments", &unique)?;
    let (body, _) = sync_quick_info_instruments(&document.body, &unique);
    document.body = body;
    Ok(removed)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DedupOptions {
    /// Rewrite cards without duplicates as well
    pub force: bool,
    pub limit: Option<usize>,
}

pub struct InstrumentDedup {
    cards: CardStore,
    options: DedupOptions,
    stats: DedupStats,
}

impl InstrumentDedup {
    pub fn new(cards: CardStore, options: DedupOptions) -> Self {
        Self {
            cards,
            options,
            stats: DedupStats::default(),
        }
    }

    pub fn statistics(&self) -> &DedupStats {
        &self.stats
    }

    pub fn run(&mut self) -> EnrichResult<&DedupStats> {
        let mut cards = self.cards.list_cards()?;
        if let Some(limit) = self.options.limit {
            cards.truncate(limit);
        }
        info!(
            cards_dir = %self.cards.cards_dir().display(),
            cards = cards.len(),
            dry_run = self.cards.is_dry_run(),
            "Deduplicating instruments"
        );

        for card in &cards {
            self.process_card(card);
        }
        Ok(&self.stats)
    }

    pub fn process_card(&mut self, path: &Path) {
        self.stats.cards_scanned += 1;
        if let Err(e) = self.process_card_inner(path) {
            error!(card = %path.display(), error = %e, "Failed to deduplicate instruments");
            self.stats.errors += 1;
        }
    }

    fn process_card_inner(&mut self, path: &Path) -> EnrichResult<()> {
        let mut document = self.cards.read(path)?;
        let Some(before) = document
            .get_str_list("instruments")
            .map(|list| list.len())
            .filter(|&count| count > 0)
        else {
            return Ok(());
        };

        let removed = dedupe_instruments(&mut document, self.options.force)?;
        if removed == 0 && !self.options.force {
            debug!(card = %path.display(), "No duplicate instruments");
            return Ok(());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!(card = %name, before, after = before - removed, removed, "Deduplicated instruments");

        self.cards.write_document(path, &document)?;
        if removed > 0 {
            self.stats.record_fix(name, removed);
        }
        Ok(())
    }
}
