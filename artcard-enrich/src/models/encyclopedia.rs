//! Accepted encyclopedia (MusicBrainz) match

use super::EntityType;
use serde::{Deserialize, Serialize};

/// Base URL for artist pages
pub const ARTIST_PAGE_URL: &str = "https://musicbrainz.org/artist";

/// Begin/end dates as reported by the encyclopedia (partial dates allowed)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeSpan {
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// One "member of band" relation
///
/// Serialised as-is into the `members` / `associated_acts` front matter lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberEntry {
    pub name: String,
    pub mbid: String,
    #[serde(default)]
    pub instruments: Vec<String>,
    #[serde(default)]
    pub begin: String,
    #[serde(default)]
    pub end: String,
}

/// Encyclopedia data for an artist whose match cleared the confidence threshold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncyclopediaMatch {
    /// Artist MBID
    pub id: String,
    /// Match confidence 0-100
    pub confidence: u8,
    pub name: String,
    pub sort_name: String,
    pub disambiguation: String,
    /// Raw entity type ("Person", "Group", "Orchestra", ...); empty when unknown
    pub artist_type: String,
    pub gender: Option<String>,
    pub life_span: LifeSpan,
    /// Begin area (birth place or formation place)
    pub origin: Option<String>,
    /// Area (usually a country)
    pub country: Option<String>,
    pub instruments: Vec<String>,
    /// Alternative names, searched name excluded, at most 5
    pub aliases: Vec<String>,
    /// Top 3 tags
    pub tags: Vec<String>,
    /// Band members (groups only)
    pub members: Vec<MemberEntry>,
    /// Founding / original members (subset of `members`)
    pub original_members: Vec<MemberEntry>,
    /// Bands this person belonged to (persons only)
    pub associated_acts: Vec<MemberEntry>,
    /// Recording collaborators, sorted and unique, at most 20
    pub collaborators: Vec<String>,
}

impl EncyclopediaMatch {
    pub fn is_person(&self) -> bool {
        self.artist_type.eq_ignore_ascii_case("person")
    }

    /// Person-vs-group classification, `None` for types that are neither
    /// (characters, unknown)
    pub fn entity_type(&self) -> Option<EntityType> {
        match self.artist_type.to_lowercase().as_str() {
            "person" => Some(EntityType::Individual),
            "group" | "band" | "orchestra" | "choir" => Some(EntityType::Group),
            _ => None,
        }
    }

    pub fn birth_date(&self) -> Option<&str> {
        non_empty(self.life_span.begin.as_deref())
    }

    /// Life-span end, reported only for persons (a group's end is a dissolution)
    pub fn death_date(&self) -> Option<&str> {
        if self.is_person() {
            non_empty(self.life_span.end.as_deref())
        } else {
            None
        }
    }

    /// Location with origin taking priority over country
    pub fn location(&self) -> Option<&str> {
        non_empty(self.origin.as_deref()).or_else(|| non_empty(self.country.as_deref()))
    }

    pub fn page_url(&self) -> String {
        format!("{}/{}", ARTIST_PAGE_URL, self.id)
    }

    /// Front matter `artist_type` value (lowercased)
    pub fn artist_type_key(&self) -> Option<String> {
        if self.artist_type.is_empty() {
            None
        } else {
            Some(self.artist_type.to_lowercase())
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
