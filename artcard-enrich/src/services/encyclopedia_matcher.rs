//! Encyclopedia candidate selection and confidence scoring
//!
//! Confidence (0-100) has three parts:
//! - search score: 0-40 (the encyclopedia's own ranking, scaled)
//! - name match: 40 exact (case-insensitive), 20 substring, 0 otherwise
//! - genre hints: 5 per distinct hint word found in the disambiguation, max 20
//!
//! Matches below [`MIN_CONFIDENCE`] are rejected so that a same-named
//! stranger never lands on a card.

use crate::error::{EnrichError, EnrichResult};
use crate::models::{EncyclopediaMatch, MemberEntry};
use crate::services::encyclopedia_client::{
    ArtistCandidate, ArtistDetail, Area, EncyclopediaSource, RecordingCredits, Relation,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Minimum confidence for a match to be used
pub const MIN_CONFIDENCE: u8 = 80;

const SEARCH_LIMIT: u32 = 10;
const MAX_ALIASES: usize = 5;
const TAG_WINDOW: usize = 10;
const MAX_TAGS: usize = 3;
const MAX_COLLABORATORS: usize = 20;

const MEMBER_OF_BAND: &str = "member of band";
/// Recording-relation attributes worth reporting as instruments
const RECORDING_INSTRUMENT_MARKERS: [&str; 3] = ["vocal", "guitar", "piano"];
/// Membership attributes that describe the role, not an instrument
const ROLE_MARKERS: [&str; 2] = ["original", "founder"];

/// Lowercase whitespace-separated words from genre hints
pub fn hint_keywords(hints: &[String]) -> BTreeSet<String> {
    hints
        .iter()
        .flat_map(|hint| {
            hint.to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Pick the most plausible candidate from a search result
///
/// Exact name matches (case-insensitive) win over everything else. Among
/// several remaining candidates, genre hints found in the disambiguation
/// break the tie; the earliest candidate wins equal scores and a zero top
/// score falls back to the first candidate.
pub fn select_candidate<'a>(
    name: &str,
    candidates: &'a [ArtistCandidate],
    hints: &[String],
) -> Option<&'a ArtistCandidate> {
    let search = normalize(name);
    let exact: Vec<&ArtistCandidate> = candidates
        .iter()
        .filter(|c| normalize(&c.name) == search)
        .collect();

    let pool: Vec<&ArtistCandidate> = if exact.is_empty() {
        candidates.iter().collect()
    } else {
        debug!(name = %name, exact = exact.len(), "Exact name matches found");
        exact
    };

    let first = *pool.first()?;
    if pool.len() == 1 || hints.is_empty() {
        return Some(first);
    }

    let keywords = hint_keywords(hints);
    let mut best = first;
    let mut best_score = 0u32;
    for candidate in pool.iter().copied() {
        let score = relevance_score(candidate, &keywords);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    if best_score > 0 {
        debug!(
            name = %best.name,
            disambiguation = %best.disambiguation,
            score = best_score,
            "Selected candidate by genre relevance"
        );
    }
    Some(best)
}

fn relevance_score(candidate: &ArtistCandidate, keywords: &BTreeSet<String>) -> u32 {
    let disambiguation = candidate.disambiguation.to_lowercase();
    let keyword_hits = keywords
        .iter()
        .filter(|k| disambiguation.contains(k.as_str()))
        .count() as u32;

    let mut score = 2 * keyword_hits;
    if !disambiguation.is_empty() {
        score += 1;
    }
    if matches!(
        candidate.artist_type.to_lowercase().as_str(),
        "person" | "group" | "band"
    ) {
        score += 1;
    }
    score
}

/// Confidence (0-100) that `candidate` is the artist named `name`
pub fn calculate_confidence(candidate: &ArtistCandidate, name: &str, hints: &[String]) -> u8 {
    let search_points = 40.0 * f64::from(candidate.score.min(100)) / 100.0;

    let candidate_name = normalize(&candidate.name);
    let search = normalize(name);
    let name_points = if candidate_name == search {
        40.0
    } else if !candidate_name.is_empty()
        && !search.is_empty()
        && (candidate_name.contains(&search) || search.contains(&candidate_name))
    {
        20.0
    } else {
        0.0
    };

    let disambiguation = candidate.disambiguation.to_lowercase();
    let genre_points = if disambiguation.is_empty() {
        0.0
    } else {
        let hits = hint_keywords(hints)
            .iter()
            .filter(|k| disambiguation.contains(k.as_str()))
            .count();
        (5 * hits).min(20) as f64
    };

    (search_points + name_points + genre_points).clamp(0.0, 100.0) as u8
}

/// Group members (or a person's bands) from "member of band" relations
///
/// For a person every relation is an associated act and the original subset
/// is always empty. For a group a member counts as original when the relation
/// attributes mention "founder" or "original", or when the membership has a
/// begin date and no end date.
pub fn parse_member_relationships(
    relations: &[Relation],
    is_person: bool,
) -> (Vec<MemberEntry>, Vec<MemberEntry>) {
    let mut members = Vec::new();
    let mut original_members = Vec::new();

    for relation in relations.iter().filter(|r| r.relation_type == MEMBER_OF_BAND) {
        let Some(artist) = relation.artist.as_ref().filter(|a| !a.name.is_empty()) else {
            continue;
        };

        let begin = relation.begin.clone().unwrap_or_default();
        let end = relation.end.clone().unwrap_or_default();
        let entry = MemberEntry {
            name: artist.name.clone(),
            mbid: artist.id.clone(),
            instruments: relation
                .attributes
                .iter()
                .filter(|a| !is_role_marker(a))
                .cloned()
                .collect(),
            begin: begin.clone(),
            end: end.clone(),
        };

        if !is_person && is_original_membership(relation, &begin, &end) {
            original_members.push(entry.clone());
        }
        members.push(entry);
    }

    (members, original_members)
}

fn is_role_marker(attribute: &str) -> bool {
    let lower = attribute.to_lowercase();
    ROLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn is_original_membership(relation: &Relation, begin: &str, end: &str) -> bool {
    relation.attributes.iter().any(|a| is_role_marker(a)) || (!begin.is_empty() && end.is_empty())
}

/// Instruments from band memberships, then from vocal/guitar/piano recording
/// credits, deduplicated in first-occurrence order
pub fn extract_instruments(relations: &[Relation]) -> Vec<String> {
    let mut instruments: Vec<String> = Vec::new();

    let membership_attributes = relations
        .iter()
        .filter(|r| r.relation_type == MEMBER_OF_BAND)
        .flat_map(|r| r.attributes.iter())
        .filter(|a| !is_role_marker(a));

    let recording_attributes = relations
        .iter()
        .filter(|r| r.target_type == "recording")
        .flat_map(|r| r.attributes.iter())
        .filter(|a| {
            let lower = a.to_lowercase();
            RECORDING_INSTRUMENT_MARKERS.iter().any(|m| lower.contains(m))
        });

    for attribute in membership_attributes.chain(recording_attributes) {
        if !instruments.contains(attribute) {
            instruments.push(attribute.clone());
        }
    }

    instruments
}

/// Other artists credited on the artist's recordings: unique, sorted, at most 20
pub fn collect_collaborators(recordings: &[RecordingCredits], mbid: &str) -> Vec<String> {
    let names: BTreeSet<&str> = recordings
        .iter()
        .flat_map(|r| r.artist_credit.iter())
        .filter(|credit| credit.artist.id != mbid && !credit.artist.name.is_empty())
        .map(|credit| credit.artist.name.as_str())
        .collect();

    names
        .into_iter()
        .take(MAX_COLLABORATORS)
        .map(str::to_string)
        .collect()
}

/// Assemble an accepted match from the lookup payload
pub fn build_match(
    searched_name: &str,
    confidence: u8,
    detail: &ArtistDetail,
    collaborators: Vec<String>,
) -> EncyclopediaMatch {
    let is_person = detail.artist_type.eq_ignore_ascii_case("person");
    let (members, original_members) = parse_member_relationships(&detail.relations, is_person);

    let aliases: Vec<String> = detail
        .aliases
        .iter()
        .map(|a| a.name.as_str())
        .filter(|a| !a.is_empty() && *a != searched_name)
        .take(MAX_ALIASES)
        .map(str::to_string)
        .collect();

    let tags: Vec<String> = detail
        .tags
        .iter()
        .take(TAG_WINDOW)
        .map(|t| t.name.as_str())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect();

    let area_name = |area: &Option<Area>| {
        area.as_ref()
            .map(|a| a.name.clone())
            .filter(|n| !n.is_empty())
    };

    let (members, associated_acts) = if is_person {
        (Vec::new(), members)
    } else {
        (members, Vec::new())
    };

    EncyclopediaMatch {
        id: detail.id.clone(),
        confidence,
        name: if detail.name.is_empty() {
            searched_name.to_string()
        } else {
            detail.name.clone()
        },
        sort_name: detail.sort_name.clone(),
        disambiguation: detail.disambiguation.clone(),
        artist_type: detail.artist_type.clone(),
        gender: detail.gender.clone().filter(|g| !g.is_empty()),
        life_span: detail.life_span.clone(),
        origin: area_name(&detail.begin_area),
        country: area_name(&detail.area),
        instruments: extract_instruments(&detail.relations),
        aliases,
        tags,
        members,
        original_members,
        associated_acts,
        collaborators,
    }
}

/// Search, select, score and enrich against an encyclopedia source
pub struct EncyclopediaMatcher {
    source: Arc<dyn EncyclopediaSource>,
    min_confidence: u8,
}

impl EncyclopediaMatcher {
    pub fn new(source: Arc<dyn EncyclopediaSource>) -> Self {
        Self {
            source,
            min_confidence: MIN_CONFIDENCE,
        }
    }

    /// Best candidate and its confidence
    ///
    /// # Errors
    /// `NotFound` when the search is empty, `LowConfidence` below the threshold,
    /// transport errors as-is.
    pub async fn find_best_match(
        &self,
        name: &str,
        hints: &[String],
    ) -> EnrichResult<(ArtistCandidate, u8)> {
        let candidates = self.source.search_artists(name, SEARCH_LIMIT).await?;

        let best = select_candidate(name, &candidates, hints)
            .ok_or_else(|| EnrichError::NotFound(format!("No MusicBrainz artist for '{}'", name)))?;

        let confidence = calculate_confidence(best, name, hints);
        if confidence < self.min_confidence {
            warn!(
                name = %name,
                candidate = %best.name,
                disambiguation = %best.disambiguation,
                confidence,
                threshold = self.min_confidence,
                "Low confidence MusicBrainz match, skipping enrichment"
            );
            return Err(EnrichError::LowConfidence {
                name: name.to_string(),
                candidate: best.name.clone(),
                confidence,
                threshold: self.min_confidence,
            });
        }

        info!(name = %best.name, mbid = %best.id, confidence, "MusicBrainz match accepted");
        Ok((best.clone(), confidence))
    }

    /// Full encyclopedia data for an accepted match
    ///
    /// A failed recordings browse only loses the collaborator list.
    pub async fn fetch_match(&self, name: &str, hints: &[String]) -> EnrichResult<EncyclopediaMatch> {
        let (candidate, confidence) = self.find_best_match(name, hints).await?;

        let detail = self.source.lookup_artist(&candidate.id).await?;

        let collaborators = match self.source.browse_recording_credits(&candidate.id).await {
            Ok(recordings) => collect_collaborators(&recordings, &candidate.id),
            Err(e) => {
                warn!(mbid = %candidate.id, error = %e, "Failed to browse MusicBrainz recordings");
                Vec::new()
            }
        };
        debug!(mbid = %candidate.id, collaborators = collaborators.len(), "Collected recording collaborators");

        Ok(build_match(name, confidence, &detail, collaborators))
    }
}
