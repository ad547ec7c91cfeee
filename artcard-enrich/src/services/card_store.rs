//! Artist card files on disk
//!
//! A card's identity is `<sanitized name>.md` in the cards folder. Older
//! folders may still hold case or punctuation variants (`DR._JOHN.md`), which
//! are detected by comparing alphanumeric-only keys.

use crate::error::EnrichResult;
use artcard_common::naming::{normalize_key, sanitize_filename};
use artcard_common::CardDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Front matter key marking a fully researched card
pub const ENHANCEMENT_KEY: &str = "enhancement_provider";
/// Value of [`ENHANCEMENT_KEY`] on a fully researched card
pub const ENHANCEMENT_PROVIDER: &str = "perplexity";

const CARD_EXTENSION: &str = "md";

/// Result of looking for an artist's card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardLookup {
    /// No card for this artist
    Absent,
    /// `<sanitized>.md` exists
    Exact(PathBuf),
    /// Only a case/punctuation variant exists
    Variant(PathBuf),
}

impl CardLookup {
    pub fn path(&self) -> Option<&Path> {
        match self {
            CardLookup::Absent => None,
            CardLookup::Exact(path) | CardLookup::Variant(path) => Some(path),
        }
    }
}

/// Whether a parsed card carries the research enhancement flag
pub fn is_enhanced(document: &CardDocument) -> bool {
    document.get_str(ENHANCEMENT_KEY) == Some(ENHANCEMENT_PROVIDER)
}

pub struct CardStore {
    cards_dir: PathBuf,
    dry_run: bool,
}

impl CardStore {
    pub fn new(cards_dir: PathBuf, dry_run: bool) -> Self {
        Self { cards_dir, dry_run }
    }

    pub fn cards_dir(&self) -> &Path {
        &self.cards_dir
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Canonical path of an artist's card
    pub fn card_path(&self, artist: &str) -> PathBuf {
        self.cards_dir
            .join(format!("{}.{}", sanitize_filename(artist), CARD_EXTENSION))
    }

    /// All `*.md` files in the cards folder, sorted by file name
    pub fn list_cards(&self) -> EnrichResult<Vec<PathBuf>> {
        if !self.cards_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut cards: Vec<PathBuf> = std::fs::read_dir(&self.cards_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(CARD_EXTENSION)
            })
            .collect();
        cards.sort();
        Ok(cards)
    }

    /// Find an artist's card: exact filename first, then variants
    pub fn find_existing(&self, artist: &str) -> EnrichResult<CardLookup> {
        let exact = self.card_path(artist);
        if exact.is_file() {
            return Ok(CardLookup::Exact(exact));
        }

        let wanted = normalize_key(&sanitize_filename(artist));
        if wanted.is_empty() {
            return Ok(CardLookup::Absent);
        }

        for card in self.list_cards()? {
            let stem = card.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if normalize_key(stem) == wanted {
                info!(
                    existing = %card.display(),
                    artist = %artist,
                    "Found case/punctuation variant"
                );
                return Ok(CardLookup::Variant(card));
            }
        }

        Ok(CardLookup::Absent)
    }

    pub fn read(&self, path: &Path) -> EnrichResult<CardDocument> {
        let content = std::fs::read_to_string(path)?;
        Ok(CardDocument::parse(&content)?)
    }

    /// Whether the card at `path` is already research-enhanced
    ///
    /// Unreadable or malformed cards count as not enhanced.
    pub fn has_enhancement(&self, path: &Path) -> bool {
        match self.read(path) {
            Ok(document) => is_enhanced(&document),
            Err(e) => {
                warn!(card = %path.display(), error = %e, "Could not check enhancement status");
                false
            }
        }
    }

    /// Replace a card's content as a whole
    ///
    /// The new content goes to a sibling temp file that is then renamed over
    /// the card; the temp file is removed when either step fails. Returns
    /// `false` in dry-run mode, where nothing is written. A path without a
    /// file stem (`.md`) is rejected.
    pub fn write(&self, path: &Path, content: &str) -> EnrichResult<bool> {
        let stem_missing = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.trim_end_matches(".md").is_empty());
        if stem_missing {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Card path has no file name: {}", path.display()),
            )
            .into());
        }

        if self.dry_run {
            info!(card = %path.display(), "[DRY RUN] Would write card");
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("md.tmp");
        let written = std::fs::write(&tmp, content).and_then(|()| std::fs::rename(&tmp, path));
        if let Err(e) = written {
            if tmp.exists() {
                if let Err(cleanup) = std::fs::remove_file(&tmp) {
                    warn!(tmp = %tmp.display(), error = %cleanup, "Could not remove temp file");
                }
            }
            return Err(e.into());
        }

        debug!(card = %path.display(), bytes = content.len(), "Wrote card");
        Ok(true)
    }

    pub fn write_document(&self, path: &Path, document: &CardDocument) -> EnrichResult<bool> {
        let content = document.render()?;
        self.write(path, &content)
    }
}
