//! Run statistics for the discovery pipeline and the maintenance utilities
//!
//! Each struct is owned by the workflow that fills it and rendered once at
//! the end of the run.

use serde::{Deserialize, Serialize};

fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// **Discovery run statistics**
///
/// Display: "N/M processed: X created, Y enhanced, Z skipped, E errors"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Artists found in the archive (after `--limit`)
    pub total: usize,
    /// Artists handled so far, whatever the outcome
    pub processed: usize,
    /// Skipped because the card is already research-enhanced
    pub skipped_enhanced: usize,
    /// Skipped because only a case/punctuation variant card exists
    pub skipped_duplicate: usize,
    /// Existing cards rebuilt with research
    pub enhanced: usize,
    /// New cards
    pub created: usize,
    pub errors: usize,
    /// Connections recorded in the ledger this run
    pub connections_found: usize,
}

impl RunStatistics {
    /// Research calls avoided by the skip rules
    pub fn api_calls_saved(&self) -> usize {
        self.skipped_enhanced + self.skipped_duplicate
    }

    /// Created + enhanced as a share of processed artists
    pub fn success_rate(&self) -> Option<f64> {
        percentage(self.created + self.enhanced, self.processed)
    }

    pub fn display_string(&self) -> String {
        format!(
            "{}/{} processed: {} created, {} enhanced, {} skipped, {} errors",
            self.processed,
            self.total,
            self.created,
            self.enhanced,
            self.api_calls_saved(),
            self.errors
        )
    }

    /// End-of-run summary lines
    pub fn summary_lines(&self, network_size: usize) -> Vec<String> {
        let mut lines = vec![
            "Processing Summary:".to_string(),
            format!("  Created: {} new cards", self.created),
            format!("  Enhanced: {} existing cards", self.enhanced),
            format!("  Skipped (already enhanced): {}", self.skipped_enhanced),
            format!("  Skipped (duplicate variant found): {}", self.skipped_duplicate),
            format!("  Connections found: {}", self.connections_found),
            format!("  Network size: {} artists", network_size),
            format!("  Errors: {}", self.errors),
            format!("  Total processed: {}/{}", self.processed, self.total),
        ];

        let saved = self.api_calls_saved();
        if saved > 0 {
            lines.push(format!("  API calls saved: skipped {} research calls", saved));
        }
        if let Some(rate) = self.success_rate() {
            lines.push(format!("  Success rate: {:.1}%", rate));
        }
        lines
    }
}

/// **Backfill statistics**
///
/// Display: "N/M processed: X updated, Y already had data, Z no match, E errors"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillStats {
    /// Cards in the folder
    pub total: usize,
    pub processed: usize,
    pub updated: usize,
    /// Skipped because the card already carries encyclopedia data
    pub skipped_has_data: usize,
    /// Skipped because no confident match was found
    pub skipped_no_match: usize,
    pub errors: usize,
}

impl BackfillStats {
    pub fn update_rate(&self) -> Option<f64> {
        percentage(self.updated, self.processed)
    }

    pub fn display_string(&self) -> String {
        format!(
            "{}/{} processed: {} updated, {} already had data, {} no match, {} errors",
            self.processed,
            self.total,
            self.updated,
            self.skipped_has_data,
            self.skipped_no_match,
            self.errors
        )
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Backfill Summary:".to_string(),
            format!("  Updated: {} cards", self.updated),
            format!("  Skipped (has encyclopedia data): {}", self.skipped_has_data),
            format!("  Skipped (no match found): {}", self.skipped_no_match),
            format!("  Errors: {}", self.errors),
            format!("  Total processed: {}/{}", self.processed, self.total),
        ];
        if let Some(rate) = self.update_rate() {
            lines.push(format!("  Update rate: {:.1}%", rate));
        }
        lines
    }
}

/// **Instrument dedup statistics**
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupStats {
    pub cards_scanned: usize,
    /// Cards whose `instruments` list had duplicates
    pub cards_fixed: usize,
    pub duplicates_removed: usize,
    pub errors: usize,
    /// (card file name, duplicates removed), most duplicates first
    pub affected: Vec<(String, usize)>,
}

impl DedupStats {
    /// Number of affected cards listed in the summary
    pub const TOP_AFFECTED: usize = 20;

    pub fn display_string(&self) -> String {
        format!(
            "{} cards scanned, {} fixed, {} duplicates removed, {} errors",
            self.cards_scanned, self.cards_fixed, self.duplicates_removed, self.errors
        )
    }

    /// Record an affected card, keeping the list sorted by duplicate count
    pub fn record_fix(&mut self, card: String, removed: usize) {
        self.cards_fixed += 1;
        self.duplicates_removed += removed;
        self.affected.push((card, removed));
        self.affected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "Instrument Dedup Summary:".to_string(),
            format!("  Cards scanned: {}", self.cards_scanned),
            format!("  Cards fixed: {}", self.cards_fixed),
            format!("  Duplicates removed: {}", self.duplicates_removed),
            format!("  Errors: {}", self.errors),
        ];
        if !self.affected.is_empty() {
            lines.push(format!(
                "  Most affected cards (top {}):",
                Self::TOP_AFFECTED.min(self.affected.len())
            ));
            for (card, removed) in self.affected.iter().take(Self::TOP_AFFECTED) {
                lines.push(format!("    {}: {} duplicates", card, removed));
            }
        }
        lines
    }
}

/// **Quick-Info sync statistics**
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickInfoStats {
    pub cards_scanned: usize,
    /// Cards with an `instruments` list
    pub cards_with_instruments: usize,
    pub cards_fixed: usize,
    pub errors: usize,
}

impl QuickInfoStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} cards scanned, {} with instruments, {} fixed, {} errors",
            self.cards_scanned, self.cards_with_instruments, self.cards_fixed, self.errors
        )
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            "Quick Info Sync Summary:".to_string(),
            format!("  Cards scanned: {}", self.cards_scanned),
            format!("  Cards with instruments: {}", self.cards_with_instruments),
            format!("  Cards fixed: {}", self.cards_fixed),
            format!("  Errors: {}", self.errors),
        ]
    }
}
