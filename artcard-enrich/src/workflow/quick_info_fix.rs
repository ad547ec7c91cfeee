//! Quick-Info instruments sync
//!
//! Rewrites every `- **Instruments**:` line in a card body so it lists the
//! front matter `instruments`. Cards without that line are not given one.

use crate::error::EnrichResult;
use crate::services::CardStore;
use crate::workflow::statistics::QuickInfoStats;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;
use tracing::{debug, error, info};

static INSTRUMENTS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(- \*\*Instruments\*\*:).*").expect("instruments line regex"));

/// Body with every Instruments line set to `instruments`, and whether it changed
pub fn sync_quick_info_instruments(body: &str, instruments: &[String]) -> (String, bool) {
    let listed = instruments.join(", ");
    let updated = INSTRUMENTS_LINE
        .replace_all(body, |caps: &Captures| format!("{} {}", &caps[1], listed))
        .into_owned();
    let changed = updated != body;
    (updated, changed)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuickInfoOptions {
    /// Rewrite cards even when the line already matches
    pub force: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickInfoOutcome {
    Fixed,
    AlreadyCorrect,
    NoInstruments,
    Failed { reason: String },
}

impl QuickInfoOutcome {
    pub fn status_line(&self) -> String {
        match self {
            QuickInfoOutcome::Fixed => "Quick Info fixed".to_string(),
            QuickInfoOutcome::AlreadyCorrect => "Already correct".to_string(),
            QuickInfoOutcome::NoInstruments => "No instruments".to_string(),
            QuickInfoOutcome::Failed { reason } => format!("Error: {}", reason),
        }
    }
}

pub struct QuickInfoFix {
    cards: CardStore,
    options: QuickInfoOptions,
    stats: QuickInfoStats,
}

impl QuickInfoFix {
    pub fn new(cards: CardStore, options: QuickInfoOptions) -> Self {
        Self {
            cards,
            options,
            stats: QuickInfoStats::default(),
        }
    }

    pub fn statistics(&self) -> &QuickInfoStats {
        &self.stats
    }

    pub fn run(&mut self) -> EnrichResult<&QuickInfoStats> {
        let mut cards = self.cards.list_cards()?;
        if let Some(limit) = self.options.limit {
            cards.truncate(limit);
        }
        info!(
            cards_dir = %self.cards.cards_dir().display(),
            cards = cards.len(),
            dry_run = self.cards.is_dry_run(),
            "Syncing Quick Info instruments"
        );

        for card in &cards {
            let outcome = self.process_card(card);
            debug!(card = %card.display(), status = %outcome.status_line());
        }
        Ok(&self.stats)
    }

    pub fn process_card(&mut self, path: &Path) -> QuickInfoOutcome {
        self.stats.cards_scanned += 1;
        match self.process_card_inner(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(card = %path.display(), error = %e, "Failed to sync Quick Info");
                self.stats.errors += 1;
                QuickInfoOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn process_card_inner(&mut self, path: &Path) -> EnrichResult<QuickInfoOutcome> {
        let mut document = self.cards.read(path)?;
        let instruments = match document.get_str_list("instruments") {
            Some(instruments) if !instruments.is_empty() => instruments,
            _ => return Ok(QuickInfoOutcome::NoInstruments),
        };
        self.stats.cards_with_instruments += 1;

        let (body, changed) = sync_quick_info_instruments(&document.body, &instruments);
        if !changed && !self.options.force {
            return Ok(QuickInfoOutcome::AlreadyCorrect);
        }

        document.body = body;
        if self.cards.write_document(path, &document)? {
            info!(card = %path.display(), "Fixed Quick Info instruments");
        }
        self.stats.cards_fixed += 1;
        Ok(QuickInfoOutcome::Fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_stale_line_is_rewritten() {
        let body = "\n## Quick Info\n- **Genres**: jazz\n- **Instruments**: trumpet, trumpet, vocals\n- **Followers**: 10\n";
        let (updated, changed) = sync_quick_info_instruments(body, &list(&["trumpet", "vocals"]));
        assert!(changed);
        assert_eq!(
            updated,
            "\n## Quick Info\n- **Genres**: jazz\n- **Instruments**: trumpet, vocals\n- **Followers**: 10\n"
        );
    }

    #[test]
    fn test_matching_line_is_unchanged() {
        let body = "- **Instruments**: piano, guitar\n";
        let (updated, changed) = sync_quick_info_instruments(body, &list(&["piano", "guitar"]));
        assert!(!changed);
        assert_eq!(updated, body);
    }

    #[test]
    fn test_missing_line_is_not_added() {
        let body = "\n## Quick Info\n- **Genres**: jazz\n";
        let (updated, changed) = sync_quick_info_instruments(body, &list(&["piano"]));
        assert!(!changed);
        assert_eq!(updated, body);
    }

    #[test]
    fn test_run_fixes_only_stale_cards() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("stale.md"),
            "---\ninstruments:\n- drums\n---\n\n## Quick Info\n- **Instruments**: drums, drums\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("fine.md"),
            "---\ninstruments:\n- bass\n---\n\n## Quick Info\n- **Instruments**: bass\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("plain.md"), "---\ntitle: Plain\n---\n").unwrap();

        let mut fix = QuickInfoFix::new(
            CardStore::new(dir.path().to_path_buf(), false),
            QuickInfoOptions::default(),
        );
        let stats = fix.run().unwrap().clone();

        assert_eq!(stats.cards_scanned, 3);
        assert_eq!(stats.cards_with_instruments, 2);
        assert_eq!(stats.cards_fixed, 1);
        assert_eq!(stats.errors, 0);
        let stale = std::fs::read_to_string(dir.path().join("stale.md")).unwrap();
        assert!(stale.ends_with("- **Instruments**: drums\n"));
    }
}
