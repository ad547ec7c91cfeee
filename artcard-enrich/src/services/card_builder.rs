//! Artist card assembly
//!
//! Merges the three sources into one card. Precedence:
//! - catalog: name-independent facts (genres, popularity, followers, profile)
//! - encyclopedia: structured facts (dates, type, members, location)
//! - research: narrative (biography, connections, fun facts)
//!
//! Parts of the body whose data is absent are left out entirely.

use crate::error::EnrichResult;
use crate::models::{
    CatalogMetadata, Connection, ConnectionKind, Connections, EncyclopediaMatch, EntityType,
    MemberEntry, ResearchResult,
};
use crate::services::card_store::ENHANCEMENT_PROVIDER;
use artcard_common::naming::{normalize_person_name, wikilink};
use artcard_common::CardDocument;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::debug;

const MAX_FRONT_MATTER_GENRES: usize = 10;
const MAX_QUICK_INFO_GENRES: usize = 5;
const ENCYCLOPEDIA_COLLABORATION_CONTEXT: &str = "Collaborated on recordings";
const ENCYCLOPEDIA_SOURCE: &str = "musicbrainz";
const PROVENANCE_LINE: &str = "*Enhanced with Perplexity AI research*";

/// Timestamp format used throughout card front matter
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Research collaborators first, then encyclopedia collaborators whose
/// normalised name is not already present
pub fn merge_collaborators(research: &[Connection], encyclopedia: &[String]) -> Vec<Connection> {
    let mut seen: HashSet<String> = research
        .iter()
        .map(|c| normalize_person_name(&c.name))
        .collect();
    let mut merged = research.to_vec();

    for name in encyclopedia {
        if seen.insert(normalize_person_name(name)) {
            merged.push(Connection {
                name: name.clone(),
                context: ENCYCLOPEDIA_COLLABORATION_CONTEXT.to_string(),
                source: Some(ENCYCLOPEDIA_SOURCE.to_string()),
                ..Default::default()
            });
        }
    }

    debug!(
        research = research.len(),
        encyclopedia = encyclopedia.len(),
        merged = merged.len(),
        "Merged collaborators"
    );
    merged
}

/// Person-vs-group decision: encyclopedia type, then member data, then the
/// research guess
pub fn classify_entity(encyclopedia: Option<&EncyclopediaMatch>, research_guess: &str) -> EntityType {
    if let Some(m) = encyclopedia {
        if let Some(entity) = m.entity_type() {
            return entity;
        }
        if !m.members.is_empty() || !m.original_members.is_empty() {
            return EntityType::Group;
        }
    }

    match research_guess.trim().to_lowercase().as_str() {
        "band" | "group" => EntityType::Group,
        _ => EntityType::Individual,
    }
}

/// Encyclopedia origin, then encyclopedia country, then the research location
pub fn resolve_location(encyclopedia: Option<&EncyclopediaMatch>, research_location: &str) -> Option<String> {
    encyclopedia
        .and_then(|m| m.location())
        .map(str::to_string)
        .or_else(|| {
            let trimmed = research_location.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
}

/// `1234567` → `1,234,567`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `#tag-name` line content for the card footer
pub fn tag_line(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag.replace([' ', '/'], "-")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trailing tags block (`\n---\n**Tags**: ...\n`)
pub fn tags_block(tags: &[String]) -> String {
    format!("\n---\n**Tags**: {}\n", tag_line(tags))
}

fn member_prefix(entry: &MemberEntry) -> String {
    let mut line = format!("- {}", wikilink(&entry.name));
    if !entry.instruments.is_empty() {
        let _ = write!(line, " - {}", entry.instruments.join(", "));
    }
    line
}

/// Band member line: `(from X until Y)`, `(from X)` or `(until Y)`
pub fn member_line(entry: &MemberEntry) -> String {
    let mut line = member_prefix(entry);
    match (entry.begin.is_empty(), entry.end.is_empty()) {
        (false, false) => {
            let _ = write!(line, " (from {} until {})", entry.begin, entry.end);
        }
        (false, true) => {
            let _ = write!(line, " (from {})", entry.begin);
        }
        (true, false) => {
            let _ = write!(line, " (until {})", entry.end);
        }
        (true, true) => {}
    }
    line
}

/// Associated act line: `(X–Y)`, `(X–present)` or `(until Y)`
pub fn associated_act_line(entry: &MemberEntry) -> String {
    let mut line = member_prefix(entry);
    match (entry.begin.is_empty(), entry.end.is_empty()) {
        (false, false) => {
            let _ = write!(line, " ({}–{})", entry.begin, entry.end);
        }
        (false, true) => {
            let _ = write!(line, " ({}–present)", entry.begin);
        }
        (true, false) => {
            let _ = write!(line, " (until {})", entry.end);
        }
        (true, true) => {}
    }
    line
}

/// `## Members` (+ `### Original Members`) for groups or `## Associated Acts`
/// for individuals; empty when there is nothing to list
pub fn members_section(
    entity: EntityType,
    members: &[MemberEntry],
    original_members: &[MemberEntry],
    associated_acts: &[MemberEntry],
) -> String {
    let mut section = String::new();
    match entity {
        EntityType::Group if !members.is_empty() => {
            section.push_str("\n## Members\n");
            for member in members {
                section.push_str(&member_line(member));
                section.push('\n');
            }
            if !original_members.is_empty() {
                section.push_str("\n### Original Members\n");
                for member in original_members {
                    section.push_str(&member_prefix(member));
                    section.push('\n');
                }
            }
        }
        EntityType::Individual if !associated_acts.is_empty() => {
            section.push_str("\n## Associated Acts\n");
            for act in associated_acts {
                section.push_str(&associated_act_line(act));
                section.push('\n');
            }
        }
        _ => {}
    }
    section
}

/// `- [[san|Name]] - context (works) [period]`
pub fn connection_line(connection: &Connection) -> String {
    let mut details = Vec::new();
    if !connection.context.trim().is_empty() {
        details.push(connection.context.trim().to_string());
    }
    if !connection.specific_works.trim().is_empty() {
        details.push(format!("({})", connection.specific_works.trim()));
    }
    if !connection.time_period.trim().is_empty() {
        details.push(format!("[{}]", connection.time_period.trim()));
    }

    if details.is_empty() {
        format!("- {}", wikilink(&connection.name))
    } else {
        format!("- {} - {}", wikilink(&connection.name), details.join(" "))
    }
}

/// `- **Born**: date, place` (either part may be missing)
pub fn born_line(birth_date: Option<&str>, place: Option<&str>) -> Option<String> {
    match (birth_date, place) {
        (Some(date), Some(place)) => Some(format!("- **Born**: {}, {}\n", date, place)),
        (Some(date), None) => Some(format!("- **Born**: {}\n", date)),
        (None, Some(place)) => Some(format!("- **Born**: {}\n", place)),
        (None, None) => None,
    }
}

/// Quick-Info instruments line
pub fn instruments_line(instruments: &[String]) -> String {
    format!("- **Instruments**: {}\n", instruments.join(", "))
}

/// Quick-Info aliases line
pub fn aliases_line(aliases: &[String]) -> String {
    format!("- **Aliases**: {}\n", aliases.join(", "))
}

#[derive(Debug, Serialize)]
pub struct SpotifyData {
    pub id: String,
    pub url: String,
    pub popularity: u32,
    pub followers: u64,
}

#[derive(Debug, Serialize)]
pub struct MusicalConnections {
    pub mentors: Vec<String>,
    pub collaborators: Vec<String>,
    pub influenced: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExternalUrls {
    pub spotify: String,
    pub wikipedia: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicbrainz: Option<String>,
}

/// Card front matter in on-disk key order
#[derive(Debug, Serialize)]
pub struct CardFrontMatter {
    pub title: String,
    pub status: String,
    pub genres: Vec<String>,
    pub spotify_data: SpotifyData,
    pub primary_source: String,
    pub enhancement_provider: String,
    pub research_sources: Vec<String>,
    pub musical_connections: MusicalConnections,
    pub network_extracted: bool,
    pub biography_enhanced_at: String,
    pub external_urls: ExternalUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub entry_created: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicbrainz_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub musicbrainz_confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instruments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub original_members: Vec<MemberEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub associated_acts: Vec<MemberEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Everything a card is built from
///
/// `research` is expected to carry the merged collaborator list already.
pub struct CardInputs<'a> {
    pub artist_name: &'a str,
    pub catalog: &'a CatalogMetadata,
    pub encyclopedia: Option<&'a EncyclopediaMatch>,
    pub research: &'a ResearchResult,
    pub image_link: Option<&'a str>,
    /// `entry_created` of the card being replaced, if any
    pub entry_created: Option<String>,
    pub now: DateTime<Utc>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn front_matter(inputs: &CardInputs<'_>, entity: EntityType, location: Option<&str>) -> CardFrontMatter {
    let now = timestamp(inputs.now);
    let catalog = inputs.catalog;
    let research = inputs.research;
    let mb = inputs.encyclopedia;

    CardFrontMatter {
        title: inputs.artist_name.to_string(),
        status: "active".to_string(),
        genres: catalog.genres.iter().take(MAX_FRONT_MATTER_GENRES).cloned().collect(),
        spotify_data: SpotifyData {
            id: catalog.id.clone(),
            url: catalog.profile_url.clone(),
            popularity: catalog.popularity,
            followers: catalog.followers,
        },
        primary_source: ENHANCEMENT_PROVIDER.to_string(),
        enhancement_provider: ENHANCEMENT_PROVIDER.to_string(),
        research_sources: research.sources.clone(),
        musical_connections: MusicalConnections {
            mentors: research.connections.names(ConnectionKind::Mentors),
            collaborators: research.connections.names(ConnectionKind::Collaborators),
            influenced: research.connections.names(ConnectionKind::Influenced),
        },
        network_extracted: true,
        biography_enhanced_at: now.clone(),
        external_urls: ExternalUrls {
            spotify: catalog.profile_url.clone(),
            wikipedia: research.wikipedia_url.clone(),
            musicbrainz: mb.map(EncyclopediaMatch::page_url),
        },
        image_path: inputs.image_link.map(str::to_string),
        entry_created: inputs.entry_created.clone().unwrap_or_else(|| now.clone()),
        last_updated: now,
        musicbrainz_id: mb.map(|m| m.id.clone()),
        musicbrainz_confidence: mb.map(|m| m.confidence),
        birth_date: mb.and_then(|m| m.birth_date()).map(str::to_string),
        death_date: mb.and_then(|m| m.death_date()).map(str::to_string),
        gender: mb.and_then(|m| m.gender.clone()),
        artist_type: mb.and_then(EncyclopediaMatch::artist_type_key),
        disambiguation: mb.and_then(|m| non_empty(&m.disambiguation)),
        instruments: mb.map(|m| m.instruments.clone()).unwrap_or_default(),
        aliases: mb.map(|m| m.aliases.clone()).unwrap_or_default(),
        tags: mb.map(|m| m.tags.clone()).unwrap_or_default(),
        members: mb.map(|m| m.members.clone()).unwrap_or_default(),
        original_members: mb.map(|m| m.original_members.clone()).unwrap_or_default(),
        associated_acts: mb.map(|m| m.associated_acts.clone()).unwrap_or_default(),
        birth_place: match entity {
            EntityType::Individual => location.map(str::to_string),
            EntityType::Group => None,
        },
        origin: match entity {
            EntityType::Group => location.map(str::to_string),
            EntityType::Individual => None,
        },
    }
}

fn connections_section(connections: &Connections) -> String {
    if connections.is_empty() {
        return String::new();
    }

    let mut section = String::from("\n## Musical Connections\n");
    for kind in ConnectionKind::ALL {
        let list = connections.of_kind(kind);
        if list.is_empty() {
            continue;
        }
        let _ = write!(section, "\n### {}\n", kind.heading());
        for connection in list {
            section.push_str(&connection_line(connection));
            section.push('\n');
        }
    }
    section
}

fn render_body(inputs: &CardInputs<'_>, entity: EntityType, location: Option<&str>) -> String {
    let catalog = inputs.catalog;
    let research = inputs.research;
    let mb = inputs.encyclopedia;
    let mut body = String::from("\n\n");

    if let Some(link) = inputs.image_link {
        let file_name = link.rsplit('/').next().unwrap_or(link);
        let _ = writeln!(body, "![]({})\n", file_name);
    }

    let _ = writeln!(body, "# {}\n", inputs.artist_name);
    body.push_str("## Quick Info\n");

    if !catalog.genres.is_empty() {
        let genres: Vec<&str> = catalog
            .genres
            .iter()
            .take(MAX_QUICK_INFO_GENRES)
            .map(String::as_str)
            .collect();
        let _ = writeln!(body, "- **Genres**: {}", genres.join(", "));
    }
    if let Some(m) = mb {
        if entity == EntityType::Individual && !m.instruments.is_empty() {
            body.push_str(&instruments_line(&m.instruments));
        }
        if !m.aliases.is_empty() {
            body.push_str(&aliases_line(&m.aliases));
        }
    }
    let _ = writeln!(body, "- **Spotify Popularity**: {}/100", catalog.popularity);
    let _ = writeln!(body, "- **Followers**: {}", format_thousands(catalog.followers));

    let birth_date = mb.and_then(|m| m.birth_date());
    match entity {
        EntityType::Individual => {
            if let Some(line) = born_line(birth_date, location) {
                body.push_str(&line);
            }
        }
        EntityType::Group => {
            if let Some(place) = location {
                let _ = writeln!(body, "- **Origin**: {}", place);
            }
        }
    }
    if let Some(died) = mb.and_then(|m| m.death_date()) {
        let _ = writeln!(body, "- **Died**: {}", died);
    }

    if !research.biography.trim().is_empty() {
        let _ = write!(
            body,
            "\n## Biography\n{}\n\n{}\n",
            research.biography.trim(),
            PROVENANCE_LINE
        );
    }

    let source_links: Vec<String> = research
        .sources
        .iter()
        .filter(|s| !s.to_lowercase().contains("wikipedia.org"))
        .enumerate()
        .map(|(i, url)| format!("[Source{}]({})", i + 1, url))
        .collect();
    if !source_links.is_empty() {
        let _ = write!(body, "\n*Sources: {}*\n", source_links.join(", "));
    }

    if !research.fun_facts.is_empty() {
        body.push_str("\n## Fun Facts\n");
        for fact in &research.fun_facts {
            let _ = writeln!(body, "- {}", fact);
        }
    }

    if let Some(m) = mb {
        body.push_str(&members_section(
            entity,
            &m.members,
            &m.original_members,
            &m.associated_acts,
        ));
    }

    body.push_str(&connections_section(&research.connections));

    body.push_str("\n## External Links\n");
    if !catalog.profile_url.is_empty() {
        let _ = writeln!(body, "- [Spotify]({})", catalog.profile_url);
    }
    if !research.wikipedia_url.trim().is_empty() {
        let _ = writeln!(body, "- [Wikipedia]({})", research.wikipedia_url.trim());
    }
    if let Some(m) = mb {
        let _ = writeln!(body, "- [MusicBrainz]({})", m.page_url());
    }

    if let Some(m) = mb.filter(|m| !m.tags.is_empty()) {
        body.push_str(&tags_block(&m.tags));
    }

    body
}

/// Build the full card document
pub fn build_card(inputs: &CardInputs<'_>) -> EnrichResult<CardDocument> {
    let entity = classify_entity(inputs.encyclopedia, &inputs.research.entity_type);
    let location = resolve_location(inputs.encyclopedia, &inputs.research.location_full);

    let front_matter = front_matter(inputs, entity, location.as_deref());
    let body = render_body(inputs, entity, location.as_deref());

    Ok(CardDocument::from_serializable(&front_matter, body)?)
}
