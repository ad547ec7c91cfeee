//! In-memory stand-ins for the three external sources
//!
//! Each fake counts its calls so tests can assert which services were hit.

use artcard_enrich::models::{CatalogMetadata, Connection, Connections, ResearchResult};
use artcard_enrich::services::encyclopedia_client::{
    ArtistCandidate, ArtistCredit, ArtistDetail, RecordingCredits, RelatedArtist,
};
use artcard_enrich::services::{CatalogSource, EncyclopediaSource, ResearchSource};
use artcard_enrich::{EnrichError, EnrichResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn catalog_entry(name: &str, genres: &[&str]) -> CatalogMetadata {
    let id = name.to_lowercase().replace(' ', "");
    CatalogMetadata {
        id: id.clone(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        popularity: 40,
        followers: 12_345,
        profile_url: format!("https://open.spotify.com/artist/{}", id),
        image_url: None,
    }
}

/// Catalog fake: known artists by exact name, everything else is a miss
#[derive(Default)]
pub struct FakeCatalog {
    artists: HashMap<String, CatalogMetadata>,
    calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn with(mut self, name: &str, genres: &[&str]) -> Self {
        self.artists.insert(name.to_string(), catalog_entry(name, genres));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn lookup_artist(&self, name: &str) -> EnrichResult<Option<CatalogMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artists.get(name).cloned())
    }
}

pub fn detail(id: &str, name: &str, artist_type: &str) -> ArtistDetail {
    ArtistDetail {
        id: id.to_string(),
        name: name.to_string(),
        sort_name: name.to_string(),
        artist_type: artist_type.to_string(),
        ..Default::default()
    }
}

/// Encyclopedia fake: one candidate per registered artist, scored 100
/// unless overridden
#[derive(Default)]
pub struct FakeEncyclopedia {
    details: HashMap<String, ArtistDetail>,
    scores: HashMap<String, u32>,
    collaborators: HashMap<String, Vec<String>>,
    unavailable: bool,
    searches: AtomicUsize,
}

impl FakeEncyclopedia {
    pub fn with(mut self, detail: ArtistDetail) -> Self {
        self.details.insert(detail.name.clone(), detail);
        self
    }

    /// Search score reported for `name`
    pub fn with_score(mut self, name: &str, score: u32) -> Self {
        self.scores.insert(name.to_string(), score);
        self
    }

    /// Recording credits shared with `names` for the artist `mbid`
    pub fn with_collaborators(mut self, mbid: &str, names: &[&str]) -> Self {
        self.collaborators
            .insert(mbid.to_string(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Every call fails as if the service were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> EnrichResult<()> {
        if self.unavailable {
            Err(EnrichError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EncyclopediaSource for FakeEncyclopedia {
    async fn search_artists(&self, name: &str, _limit: u32) -> EnrichResult<Vec<ArtistCandidate>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .details
            .get(name)
            .map(|d| ArtistCandidate {
                id: d.id.clone(),
                name: d.name.clone(),
                score: self.scores.get(name).copied().unwrap_or(100),
                artist_type: d.artist_type.clone(),
                disambiguation: d.disambiguation.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn lookup_artist(&self, mbid: &str) -> EnrichResult<ArtistDetail> {
        self.check_available()?;
        self.details
            .values()
            .find(|d| d.id == mbid)
            .cloned()
            .ok_or_else(|| EnrichError::NotFound(mbid.to_string()))
    }

    async fn browse_recording_credits(&self, mbid: &str) -> EnrichResult<Vec<RecordingCredits>> {
        self.check_available()?;
        let credits = self
            .collaborators
            .get(mbid)
            .map(|names| {
                names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| ArtistCredit {
                        name: name.clone(),
                        artist: RelatedArtist {
                            id: format!("collab-{}", i),
                            name: name.clone(),
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(vec![RecordingCredits {
            title: "Session".to_string(),
            artist_credit: credits,
        }])
    }
}

pub fn research_with_collaborators(names: &[&str]) -> ResearchResult {
    ResearchResult {
        biography: "A New Orleans original.".to_string(),
        connections: Connections {
            collaborators: names
                .iter()
                .map(|name| Connection {
                    name: name.to_string(),
                    context: "Studio sessions".to_string(),
                    confidence: Some(0.9),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        },
        fun_facts: vec!["Played piano at age five".to_string()],
        sources: vec!["https://example.org/bio".to_string()],
        wikipedia_url: "https://en.wikipedia.org/wiki/Example".to_string(),
        location_full: "New Orleans, Louisiana".to_string(),
        entity_type: "individual".to_string(),
    }
}

/// Research fake: canned results, optional failures by artist name
#[derive(Default)]
pub struct FakeResearch {
    results: HashMap<String, ResearchResult>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeResearch {
    pub fn with(mut self, name: &str, result: ResearchResult) -> Self {
        self.results.insert(name.to_string(), result);
        self
    }

    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchSource for FakeResearch {
    async fn research(&self, name: &str, _catalog: &CatalogMetadata) -> EnrichResult<ResearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(name) {
            return Err(EnrichError::ParseFailure("Empty response".to_string()));
        }
        Ok(self
            .results
            .get(name)
            .cloned()
            .unwrap_or_else(|| research_with_collaborators(&[])))
    }
}
