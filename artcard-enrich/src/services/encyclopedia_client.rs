//! MusicBrainz ws/2 client
//!
//! Thin wrapper over three JSON endpoints: artist search, artist lookup with
//! relationships, and recording browse by artist. Interpretation of the
//! payloads lives in [`super::encyclopedia_matcher`].

use crate::error::{EnrichError, EnrichResult};
use crate::models::{null_as_default, LifeSpan};
use crate::services::rate_limiter::ServiceRateLimiter;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const LOOKUP_INCLUDES: &str = "artist-rels+recording-rels+aliases+tags+ratings";
const BROWSE_LIMIT: u32 = 100;

static LUCENE_SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[+\-&|!(){}\[\]^"~*?:\\/]"#).expect("lucene special characters regex")
});

/// Artist-field search query with Lucene syntax characters escaped
pub fn artist_query(name: &str) -> String {
    format!("artist:({})", LUCENE_SPECIAL.replace_all(name.trim(), r"\$0"))
}

/// Search result entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtistCandidate {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Search relevance 0-100
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: u32,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub artist_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disambiguation: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: Vec<ArtistCandidate>,
}

/// Named area (country, city)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Area {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Artist referenced from a relation or an artist credit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RelatedArtist {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Relationship attached to an artist lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Relation {
    /// e.g. "member of band", "instrument", "vocal"
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub relation_type: String,
    /// "artist", "recording", ...
    #[serde(rename = "target-type", default, deserialize_with = "null_as_default")]
    pub target_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub artist: Option<RelatedArtist>,
}

/// Artist lookup payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtistDetail {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "sort-name", default, deserialize_with = "null_as_default")]
    pub sort_name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub artist_type: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disambiguation: String,
    #[serde(rename = "life-span", default, deserialize_with = "null_as_default")]
    pub life_span: LifeSpan,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(rename = "begin-area", default)]
    pub begin_area: Option<Area>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<NamedEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<NamedEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtistCredit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub artist: RelatedArtist,
}

/// Recording with its artist credits
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordingCredits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "artist-credit", default, deserialize_with = "null_as_default")]
    pub artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    #[serde(default)]
    recordings: Vec<RecordingCredits>,
}

/// Music encyclopedia queries needed by the matcher
#[async_trait]
pub trait EncyclopediaSource: Send + Sync {
    /// Free-text artist search, best candidates first
    async fn search_artists(&self, name: &str, limit: u32) -> EnrichResult<Vec<ArtistCandidate>>;

    /// Full artist record with relationships, aliases and tags
    async fn lookup_artist(&self, mbid: &str) -> EnrichResult<ArtistDetail>;

    /// Recordings credited to the artist, with all artist credits
    async fn browse_recording_credits(&self, mbid: &str) -> EnrichResult<Vec<RecordingCredits>>;
}

/// Live MusicBrainz client (1 request per second by default)
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: ServiceRateLimiter,
}

impl MusicBrainzClient {
    pub fn new(user_agent: &str, rate_limit_ms: u64) -> EnrichResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: MUSICBRAINZ_BASE_URL.to_string(),
            rate_limiter: ServiceRateLimiter::from_millis("musicbrainz", rate_limit_ms),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> EnrichResult<T> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Querying MusicBrainz API");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("fmt", "json")])
            .send()
            .await?;

        let status = response.status();

        if status == 404 {
            return Err(EnrichError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichError::Api(status.as_u16(), error_text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EnrichError::ParseFailure(format!("MusicBrainz {}: {}", path, e)))
    }
}

#[async_trait]
impl EncyclopediaSource for MusicBrainzClient {
    async fn search_artists(&self, name: &str, limit: u32) -> EnrichResult<Vec<ArtistCandidate>> {
        let response: SearchResponse = self
            .get_json(
                "artist",
                &[("query", artist_query(name)), ("limit", limit.to_string())],
            )
            .await?;
        Ok(response.artists)
    }

    async fn lookup_artist(&self, mbid: &str) -> EnrichResult<ArtistDetail> {
        self.get_json(
            &format!("artist/{}", mbid),
            &[("inc", LOOKUP_INCLUDES.to_string())],
        )
        .await
    }

    async fn browse_recording_credits(&self, mbid: &str) -> EnrichResult<Vec<RecordingCredits>> {
        let response: BrowseResponse = self
            .get_json(
                "recording",
                &[
                    ("artist", mbid.to_string()),
                    ("limit", BROWSE_LIMIT.to_string()),
                    ("inc", "artist-credits".to_string()),
                ],
            )
            .await?;
        Ok(response.recordings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(MusicBrainzClient::new("artcard-test/0.1 ( https://example.org )", 1000).is_ok());
    }

    #[test]
    fn test_artist_query_escapes_lucene_syntax() {
        assert_eq!(artist_query("Dr. John"), "artist:(Dr. John)");
        assert_eq!(artist_query("AC/DC"), r"artist:(AC\/DC)");
        assert_eq!(
            artist_query("Clarence \"Gatemouth\" Brown"),
            r#"artist:(Clarence \"Gatemouth\" Brown)"#
        );
        assert_eq!(
            artist_query("Earth, Wind & Fire"),
            r"artist:(Earth, Wind \& Fire)"
        );
        assert_eq!(
            artist_query(" Irma Thomas (live)! "),
            r"artist:(Irma Thomas \(live\)\!)"
        );
        assert_eq!(artist_query("Jay-Z: a+b"), r"artist:(Jay\-Z\: a\+b)");
    }

    #[test]
    fn test_search_payload_deserializes() {
        let json = r#"{"created":"2024-01-01T00:00:00Z","count":2,"offset":0,"artists":[
            {"id":"a1","type":"Person","score":100,"name":"Dr. John","sort-name":"John, Dr.","disambiguation":"New Orleans pianist"},
            {"id":"a2","type":null,"score":62,"name":"John Doctor"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.artists.len(), 2);
        assert_eq!(response.artists[0].artist_type, "Person");
        assert_eq!(response.artists[1].artist_type, "");
        assert_eq!(response.artists[1].disambiguation, "");
    }

    #[test]
    fn test_lookup_payload_deserializes() {
        let json = r#"{
            "id":"b1","name":"The Meters","sort-name":"Meters, The","type":"Group","gender":null,
            "disambiguation":"","life-span":{"begin":"1965","end":"1977","ended":true},
            "area":{"name":"United States"},"begin-area":{"name":"New Orleans"},
            "aliases":[{"name":"Neville Sounds"}],"tags":[{"name":"funk","count":5}],
            "relations":[
                {"type":"member of band","target-type":"artist","direction":"backward",
                 "attributes":["original","bass guitar"],"begin":"1965","end":null,
                 "artist":{"id":"m1","name":"George Porter Jr."}},
                {"type":"instrument","target-type":"recording","attributes":["piano"]}
            ]}"#;
        let detail: ArtistDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.sort_name, "Meters, The");
        assert_eq!(detail.life_span.end.as_deref(), Some("1977"));
        assert_eq!(detail.begin_area.unwrap().name, "New Orleans");
        assert_eq!(detail.relations.len(), 2);
        assert_eq!(detail.relations[0].end, None);
        assert_eq!(
            detail.relations[0].artist.as_ref().map(|a| a.name.as_str()),
            Some("George Porter Jr.")
        );
    }
}
