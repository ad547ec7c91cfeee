//! Spotify Web API client (client-credentials flow)

use crate::error::{EnrichError, EnrichResult};
use crate::models::{null_as_default, CatalogMetadata};
use crate::services::rate_limiter::ServiceRateLimiter;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_LIMIT: &str = "10";
/// Tokens are refreshed this long before they expire
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Streaming catalog lookup
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Top search hit for `name`; `Ok(None)` when the catalog has no match
    async fn lookup_artist(&self, name: &str) -> EnrichResult<Option<CatalogMetadata>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: Option<ArtistPage>,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    popularity: u32,
    #[serde(default)]
    followers: Option<Followers>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
    #[serde(default, deserialize_with = "null_as_default")]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Followers {
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl From<SpotifyArtist> for CatalogMetadata {
    fn from(artist: SpotifyArtist) -> Self {
        CatalogMetadata {
            profile_url: artist
                .external_urls
                .and_then(|urls| urls.spotify)
                .unwrap_or_default(),
            followers: artist.followers.and_then(|f| f.total).unwrap_or(0),
            image_url: artist.images.into_iter().next().map(|image| image.url),
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity.min(100),
        }
    }
}

/// First artist of a search response
fn first_artist(response: SearchResponse) -> Option<CatalogMetadata> {
    response
        .artists
        .and_then(|page| page.items.into_iter().next())
        .map(CatalogMetadata::from)
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Live Spotify client
///
/// Owns its bearer token; the token is reused until shortly before expiry
/// and dropped on a 401.
pub struct SpotifyClient {
    http_client: reqwest::Client,
    token_url: String,
    search_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
    rate_limiter: ServiceRateLimiter,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String, rate_limit_ms: u64) -> EnrichResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            search_url: SPOTIFY_SEARCH_URL.to_string(),
            client_id,
            client_secret,
            token: Mutex::new(None),
            rate_limiter: ServiceRateLimiter::from_millis("spotify", rate_limit_ms),
        })
    }

    /// Point the client at other token and search endpoints
    pub fn with_endpoints(mut self, token_url: impl Into<String>, search_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.search_url = search_url.into();
        self
    }

    /// Exchange the credentials for a token now, so bad credentials stop a
    /// run before the first artist
    pub async fn verify_credentials(&self) -> EnrichResult<()> {
        self.access_token().await.map(|_| ())
    }

    async fn authenticate(&self) -> EnrichResult<CachedToken> {
        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichError::TransientAuthFailure(format!(
                "Spotify token exchange returned {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token
            .expires_in
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);

        info!("Successfully authenticated with Spotify API");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }

    /// Cached token, re-authenticating when missing or expired
    async fn access_token(&self) -> EnrichResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.access_token.clone());
        }

        let token = self.authenticate().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl CatalogSource for SpotifyClient {
    async fn lookup_artist(&self, name: &str) -> EnrichResult<Option<CatalogMetadata>> {
        let mut reauthenticated = false;

        loop {
            let token = self.access_token().await?;
            self.rate_limiter.acquire().await;

            debug!(artist = %name, "Searching Spotify");
            let response = self
                .http_client
                .get(&self.search_url)
                .bearer_auth(&token)
                .query(&[("q", name), ("type", "artist"), ("limit", SEARCH_LIMIT)])
                .send()
                .await?;

            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                self.invalidate_token().await;
                if reauthenticated {
                    return Err(EnrichError::TransientAuthFailure(format!(
                        "Spotify rejected a fresh token while searching for '{}'",
                        name
                    )));
                }
                warn!("Spotify token expired, re-authenticating");
                reauthenticated = true;
                continue;
            }

            if !status.is_success() {
                warn!(artist = %name, status = status.as_u16(), "Spotify search failed");
                return Ok(None);
            }

            let search: SearchResponse = response.json().await?;
            let metadata = first_artist(search);
            match &metadata {
                Some(found) => info!(artist = %found.name, id = %found.id, "Found Spotify artist"),
                None => warn!(artist = %name, "No Spotify artist found"),
            }
            return Ok(metadata);
        }
    }
}
