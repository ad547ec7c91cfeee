//! Encyclopedia backfill for existing cards
//!
//! Adds MusicBrainz facts to cards that were written without them. The merge
//! is additive: front matter fields already present are never overwritten,
//! and research-derived fields (biography, connections, sources) are never
//! touched. Body edits are targeted insertions into the existing sections.

use crate::error::EnrichResult;
use crate::models::{EncyclopediaMatch, EntityType};
use crate::services::card_builder::{
    aliases_line, born_line, instruments_line, members_section, tags_block, timestamp,
};
use crate::services::{CardStore, EncyclopediaMatcher};
use crate::workflow::statistics::BackfillStats;
use artcard_common::CardDocument;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;
use tracing::{error, info};

/// Front matter fields whose presence means a card already has encyclopedia data
const ENCYCLOPEDIA_FIELDS: [&str; 5] = ["birth_date", "death_date", "gender", "disambiguation", "aliases"];

const QUICK_INFO_HEADING: &str = "## Quick Info\n";

static GENRES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- \*\*Genres\*\*:.*\n").expect("genres line regex"));
static INSTRUMENTS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- \*\*Instruments\*\*:.*\n").expect("instruments line regex"));
static BORN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"- \*\*Born\*\*:.*\n").expect("born line regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillOptions {
    /// Re-process cards that already carry encyclopedia data
    pub force: bool,
    /// Process only the first N cards (sorted by file name)
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    Updated,
    SkippedHasData,
    SkippedNoMatch { reason: String },
    Failed { reason: String },
}

impl BackfillOutcome {
    pub fn status_line(&self) -> String {
        match self {
            BackfillOutcome::Updated => "Updated".to_string(),
            BackfillOutcome::SkippedHasData => "Already has encyclopedia data".to_string(),
            BackfillOutcome::SkippedNoMatch { reason } => format!("No match: {}", reason),
            BackfillOutcome::Failed { reason } => format!("Error: {}", reason),
        }
    }
}

/// Whether a card still lacks encyclopedia data
pub fn needs_enrichment(document: &CardDocument) -> bool {
    !document.has_value("musicbrainz_id")
        && !ENCYCLOPEDIA_FIELDS.iter().any(|field| document.has_value(field))
}

/// Name to search for: the card title, else the file stem with `_` → space
pub fn search_name(document: &CardDocument, path: &Path) -> String {
    match document.get_str("title").map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().replace('_', " "))
            .unwrap_or_default(),
    }
}

fn set_list_if_empty<T: serde::Serialize>(
    document: &mut CardDocument,
    key: &str,
    values: &[T],
) -> EnrichResult<()> {
    if !values.is_empty() {
        document.set_if_empty(key, values)?;
    }
    Ok(())
}

fn set_text_if_empty(document: &mut CardDocument, key: &str, value: Option<&str>) -> EnrichResult<()> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        document.set_if_empty(key, value)?;
    }
    Ok(())
}

/// Additive front matter merge
pub fn merge_front_matter(
    document: &mut CardDocument,
    found: &EncyclopediaMatch,
    now: DateTime<Utc>,
) -> EnrichResult<()> {
    document.set("musicbrainz_id", &found.id)?;
    document.set_nested("external_urls", "musicbrainz", found.page_url())?;

    set_text_if_empty(document, "birth_date", found.birth_date())?;
    set_text_if_empty(document, "death_date", found.death_date())?;
    set_text_if_empty(document, "gender", found.gender.as_deref())?;
    set_text_if_empty(document, "artist_type", found.artist_type_key().as_deref())?;
    set_text_if_empty(document, "disambiguation", Some(found.disambiguation.as_str()))?;
    set_list_if_empty(document, "instruments", &found.instruments)?;
    set_list_if_empty(document, "aliases", &found.aliases)?;
    set_list_if_empty(document, "tags", &found.tags)?;
    set_list_if_empty(document, "members", &found.members)?;
    set_list_if_empty(document, "original_members", &found.original_members)?;
    set_list_if_empty(document, "associated_acts", &found.associated_acts)?;

    if let Some(location) = found.location() {
        if !document.has_value("origin") && !document.has_value("birth_place") {
            let key = if found.is_person() { "birth_place" } else { "origin" };
            document.set(key, location)?;
        }
    }

    let stamp = timestamp(now);
    document.set("last_updated", &stamp)?;
    document.set("musicbrainz_enriched_at", &stamp)?;
    Ok(())
}

/// Insert `line` after the first match of `pattern`; unchanged when absent
fn insert_after(pattern: &Regex, text: &str, line: &str) -> String {
    pattern
        .replace(text, |caps: &Captures| format!("{}{}", &caps[0], line))
        .into_owned()
}

fn push_line(section: &mut String, line: &str) {
    if !section.is_empty() && !section.ends_with('\n') {
        section.push('\n');
    }
    section.push_str(line);
}

/// Add Instruments (persons), Aliases, Born and Died lines to Quick Info
///
/// `birth_place` is the place shown on the Born line; the line is only
/// written when both the date and the place are known.
pub fn update_quick_info(
    body: &str,
    found: &EncyclopediaMatch,
    birth_place: Option<&str>,
) -> String {
    let Some(heading) = body.find(QUICK_INFO_HEADING) else {
        return body.to_string();
    };
    let start = heading + QUICK_INFO_HEADING.len();
    let end = body[start..]
        .find("\n##")
        .map(|offset| start + offset)
        .unwrap_or(body.len());

    let original = &body[start..end];
    let mut section = original.to_string();

    if found.is_person() && !found.instruments.is_empty() && !original.contains("**Instruments**") {
        section = insert_after(&GENRES_LINE, &section, &instruments_line(&found.instruments));
    }

    if !found.aliases.is_empty() && !original.contains("**Aliases**") {
        let anchor = if section.contains("**Instruments**") {
            &INSTRUMENTS_LINE
        } else {
            &GENRES_LINE
        };
        section = insert_after(anchor, &section, &aliases_line(&found.aliases));
    }

    if found.is_person() {
        if let (Some(date), Some(place)) = (found.birth_date(), birth_place) {
            if let Some(line) = born_line(Some(date), Some(place)) {
                let born = &*BORN_LINE;
                if born.is_match(&section) {
                    section = born.replace(&section, |_: &Captures| line.clone()).into_owned();
                } else if !section.contains("**Born**") {
                    push_line(&mut section, &line);
                }
            }
        }
    }

    if let Some(died) = found.death_date() {
        if !original.contains("**Died**") {
            push_line(&mut section, &format!("- **Died**: {}\n", died));
        }
    }

    format!("{}{}{}", &body[..start], section, &body[end..])
}

/// Insert `## Members` (groups) or `## Associated Acts` (persons)
///
/// A person card carrying a `## Members` heading has it renamed instead.
/// Cards that already have the right section, or have neither a Musical
/// Connections nor an External Links heading to insert before, are left as-is.
pub fn add_members_section(body: &str, found: &EncyclopediaMatch) -> String {
    let person = found.is_person();

    if person && body.contains("## Members") {
        info!("Renamed '## Members' to '## Associated Acts' on an individual's card");
        return body.replace("## Members", "## Associated Acts");
    }
    if (body.contains("## Members") && !person) || body.contains("## Associated Acts") {
        return body.to_string();
    }

    let Some(position) = body
        .find("## Musical Connections")
        .or_else(|| body.find("## External Links"))
    else {
        return body.to_string();
    };

    let entity = if person { EntityType::Individual } else { EntityType::Group };
    let section = members_section(entity, &found.members, &found.original_members, &found.associated_acts);
    if section.is_empty() {
        return body.to_string();
    }

    let before = body[..position].trim_end_matches('\n');
    format!("{}\n{}\n{}", before, section, &body[position..])
}

/// Add a MusicBrainz entry at the end of the External Links section
pub fn add_encyclopedia_link(body: &str, found: &EncyclopediaMatch) -> String {
    let Some(position) = body.find("## External Links") else {
        return body.to_string();
    };
    if body.contains("MusicBrainz") {
        return body.to_string();
    }

    let after = position + 1;
    let end = body[after..]
        .find("\n## ")
        .or_else(|| body[after..].find("\n---"))
        .map(|offset| after + offset)
        .unwrap_or(body.len());

    let mut link = format!("- [MusicBrainz]({})\n", found.page_url());
    if !body[..end].ends_with('\n') {
        link.insert(0, '\n');
    }
    format!("{}{}{}", &body[..end], link, &body[end..])
}

/// Append the trailing tags block unless the card already has one
pub fn add_tags(body: &str, found: &EncyclopediaMatch) -> String {
    if found.tags.is_empty() || body.contains("**Tags**:") {
        return body.to_string();
    }
    format!("{}{}", body.trim_end(), tags_block(&found.tags))
}

/// Merge an encyclopedia match into a parsed card (front matter and body)
pub fn enrich_document(
    document: &mut CardDocument,
    found: &EncyclopediaMatch,
    now: DateTime<Utc>,
) -> EnrichResult<()> {
    merge_front_matter(document, found, now)?;

    let birth_place = document
        .get_str("birth_place")
        .map(str::to_string)
        .or_else(|| found.location().map(str::to_string));

    let mut body = update_quick_info(&document.body, found, birth_place.as_deref());
    if !found.members.is_empty() || !found.associated_acts.is_empty() {
        body = add_members_section(&body, found);
    }
    body = add_encyclopedia_link(&body, found);
    body = add_tags(&body, found);

    document.body = body;
    Ok(())
}

/// Walks the cards folder and backfills each card in turn
pub struct BackfillWorkflow {
    matcher: EncyclopediaMatcher,
    cards: CardStore,
    options: BackfillOptions,
    stats: BackfillStats,
}

impl BackfillWorkflow {
    pub fn new(matcher: EncyclopediaMatcher, cards: CardStore, options: BackfillOptions) -> Self {
        Self {
            matcher,
            cards,
            options,
            stats: BackfillStats::default(),
        }
    }

    pub fn statistics(&self) -> &BackfillStats {
        &self.stats
    }

    /// Process every card (up to the configured limit)
    ///
    /// # Errors
    /// Only when the cards folder cannot be listed; per-card failures are
    /// counted in the statistics.
    pub async fn run(&mut self) -> EnrichResult<&BackfillStats> {
        let mut cards = self.cards.list_cards()?;
        self.stats.total = cards.len();
        if let Some(limit) = self.options.limit {
            cards.truncate(limit);
            info!(limit, "Limited to first cards");
        }

        info!(
            cards_dir = %self.cards.cards_dir().display(),
            total = self.stats.total,
            processing = cards.len(),
            dry_run = self.cards.is_dry_run(),
            force = self.options.force,
            "Starting encyclopedia backfill"
        );

        for (index, card) in cards.iter().enumerate() {
            let outcome = self.process_card(card).await;
            info!(
                progress = format!("{}/{}", index + 1, cards.len()),
                card = %card.display(),
                status = %outcome.status_line()
            );
        }

        Ok(&self.stats)
    }

    /// Backfill one card; never fails the run
    pub async fn process_card(&mut self, path: &Path) -> BackfillOutcome {
        let outcome = match self.process_card_inner(path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(card = %path.display(), error = %e, "Failed to backfill card");
                BackfillOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        match &outcome {
            BackfillOutcome::Updated => self.stats.updated += 1,
            BackfillOutcome::SkippedHasData => self.stats.skipped_has_data += 1,
            BackfillOutcome::SkippedNoMatch { .. } => self.stats.skipped_no_match += 1,
            BackfillOutcome::Failed { .. } => self.stats.errors += 1,
        }
        self.stats.processed += 1;
        outcome
    }

    async fn process_card_inner(&self, path: &Path) -> EnrichResult<BackfillOutcome> {
        let mut document = self.cards.read(path)?;

        if !self.options.force && !needs_enrichment(&document) {
            return Ok(BackfillOutcome::SkippedHasData);
        }

        let name = search_name(&document, path);
        let hints = document.get_str_list("genres").unwrap_or_default();

        let found = match self.matcher.fetch_match(&name, &hints).await {
            Ok(found) => found,
            Err(e) if e.is_no_match() => {
                return Ok(BackfillOutcome::SkippedNoMatch {
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        enrich_document(&mut document, &found, Utc::now())?;
        if self.cards.write_document(path, &document)? {
            info!(card = %path.display(), mbid = %found.id, "Updated card");
        }
        Ok(BackfillOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LifeSpan, MemberEntry};
    use chrono::TimeZone;
    use std::path::PathBuf;

    const CARD: &str = "---
title: Dr. John
genres:
- new orleans blues
enhancement_provider: perplexity
external_urls:
  spotify: https://open.spotify.com/artist/4ntA
---

# Dr. John

## Quick Info
- **Genres**: new orleans blues
- **Spotify Popularity**: 52/100
- **Followers**: 1,234
- **Born**: New Orleans

## Biography
Pianist.

## Musical Connections

### Mentors/Influences
- [[professor_longhair|Professor Longhair]] - Piano style

## External Links
- [Spotify](https://open.spotify.com/artist/4ntA)
";

    fn person() -> EncyclopediaMatch {
        EncyclopediaMatch {
            id: "mb-1".to_string(),
            confidence: 95,
            name: "Dr. John".to_string(),
            artist_type: "Person".to_string(),
            gender: Some("Male".to_string()),
            life_span: LifeSpan {
                begin: Some("1941-11-20".to_string()),
                end: Some("2019-06-06".to_string()),
            },
            origin: Some("New Orleans".to_string()),
            instruments: vec!["piano".to_string(), "guitar".to_string()],
            aliases: vec!["Mac Rebennack".to_string()],
            tags: vec!["new orleans".to_string(), "blues/rock".to_string()],
            associated_acts: vec![MemberEntry {
                name: "The Meters".to_string(),
                mbid: "mb-2".to_string(),
                begin: "1970".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_quick_info_line_patterns() {
        assert!(GENRES_LINE.is_match("- **Genres**: funk, soul\n"));
        assert!(INSTRUMENTS_LINE.is_match("- **Instruments**: piano\n"));
        assert!(BORN_LINE.is_match("- **Born**: 1941-11-20, New Orleans\n"));
        assert!(!GENRES_LINE.is_match("- **Genres**: no newline"));
    }

    #[test]
    fn test_needs_enrichment() {
        let plain = CardDocument::parse("---\ntitle: X\n---\n").unwrap();
        assert!(needs_enrichment(&plain));

        let with_id = CardDocument::parse("---\nmusicbrainz_id: abc\n---\n").unwrap();
        assert!(!needs_enrichment(&with_id));

        let with_gender = CardDocument::parse("---\ngender: Female\n---\n").unwrap();
        assert!(!needs_enrichment(&with_gender));

        let empty_aliases = CardDocument::parse("---\naliases: []\n---\n").unwrap();
        assert!(needs_enrichment(&empty_aliases));
    }

    #[test]
    fn test_search_name_falls_back_to_stem() {
        let untitled = CardDocument::parse("---\ngenres: []\n---\n").unwrap();
        assert_eq!(
            search_name(&untitled, &PathBuf::from("/cards/Professor_Longhair.md")),
            "Professor Longhair"
        );
    }

    #[test]
    fn test_merge_never_overwrites_existing_fields() {
        let mut document =
            CardDocument::parse("---\ntitle: Dr. John\ngender: Other\nbirth_place: Louisiana\n---\n").unwrap();
        merge_front_matter(&mut document, &person(), now()).unwrap();

        assert_eq!(document.get_str("gender"), Some("Other"));
        assert_eq!(document.get_str("birth_place"), Some("Louisiana"));
        assert!(!document.has_value("origin"));
        assert_eq!(document.get_str("birth_date"), Some("1941-11-20"));
        assert_eq!(document.get_str("artist_type"), Some("person"));
        assert_eq!(document.get_str("musicbrainz_id"), Some("mb-1"));
        assert_eq!(document.get_str("musicbrainz_enriched_at"), Some("2024-03-01T12:00:00Z"));
        assert!(!document.has_value("disambiguation"));
    }

    #[test]
    fn test_group_location_goes_to_origin() {
        let group = EncyclopediaMatch {
            id: "mb-9".to_string(),
            artist_type: "Group".to_string(),
            country: Some("US".to_string()),
            ..Default::default()
        };
        let mut document = CardDocument::parse("---\ntitle: The Meters\n---\n").unwrap();
        merge_front_matter(&mut document, &group, now()).unwrap();
        assert_eq!(document.get_str("origin"), Some("US"));
        assert!(!document.has_value("birth_place"));
    }

    #[test]
    fn test_quick_info_gains_instruments_aliases_born_and_died() {
        let document = CardDocument::parse(CARD).unwrap();
        let body = update_quick_info(&document.body, &person(), Some("New Orleans"));

        assert!(body.contains(
            "- **Genres**: new orleans blues\n- **Instruments**: piano, guitar\n- **Aliases**: Mac Rebennack\n- **Spotify Popularity**"
        ));
        assert!(body.contains("- **Born**: 1941-11-20, New Orleans\n- **Died**: 2019-06-06\n\n## Biography"));
        assert!(!body.contains("- **Born**: New Orleans\n"));
    }

    #[test]
    fn test_quick_info_aliases_follow_genres_without_instruments() {
        let group = EncyclopediaMatch {
            artist_type: "Group".to_string(),
            instruments: vec!["drums".to_string()],
            aliases: vec!["The Neville Sounds".to_string()],
            ..Default::default()
        };
        let body = "\n## Quick Info\n- **Genres**: funk\n- **Followers**: 3\n";
        let updated = update_quick_info(body, &group, None);
        assert_eq!(
            updated,
            "\n## Quick Info\n- **Genres**: funk\n- **Aliases**: The Neville Sounds\n- **Followers**: 3\n"
        );
    }

    #[test]
    fn test_associated_acts_inserted_before_connections() {
        let document = CardDocument::parse(CARD).unwrap();
        let body = add_members_section(&document.body, &person());
        assert!(body.contains(
            "Pianist.\n\n## Associated Acts\n- [[the_meters|The Meters]] (1970–present)\n\n## Musical Connections"
        ));
    }

    #[test]
    fn test_members_heading_on_person_is_renamed() {
        let body = "\n## Members\n- [[the_meters|The Meters]]\n\n## External Links\n";
        let updated = add_members_section(body, &person());
        assert_eq!(updated, "\n## Associated Acts\n- [[the_meters|The Meters]]\n\n## External Links\n");
    }

    #[test]
    fn test_encyclopedia_link_lands_before_tags() {
        let body = "\n## External Links\n- [Spotify](s)\n\n---\n**Tags**: #blues\n";
        let updated = add_encyclopedia_link(body, &person());
        assert_eq!(
            updated,
            "\n## External Links\n- [Spotify](s)\n- [MusicBrainz](https://musicbrainz.org/artist/mb-1)\n\n---\n**Tags**: #blues\n"
        );
        assert_eq!(add_encyclopedia_link(&updated, &person()), updated);
    }

    #[test]
    fn test_tags_appended_once() {
        let body = "\n## External Links\n- [Spotify](s)\n\n";
        let updated = add_tags(body, &person());
        assert_eq!(
            updated,
            "\n## External Links\n- [Spotify](s)\n---\n**Tags**: #new-orleans, #blues-rock\n"
        );
        assert_eq!(add_tags(&updated, &person()), updated);
    }

    #[test]
    fn test_enrich_document_is_idempotent_on_body() {
        let mut document = CardDocument::parse(CARD).unwrap();
        enrich_document(&mut document, &person(), now()).unwrap();
        let first = document.body.clone();
        assert!(first.contains("- [MusicBrainz](https://musicbrainz.org/artist/mb-1)"));
        assert!(first.contains("## Associated Acts"));
        assert!(first.contains("**Tags**: #new-orleans, #blues-rock"));
        assert_eq!(document.get_str("enhancement_provider"), Some("perplexity"));

        enrich_document(&mut document, &person(), now()).unwrap();
        assert_eq!(document.body, first);
    }
}
