//! Perplexity chat-completions research client
//!
//! One request per artist. The model is asked for strict JSON; code fences
//! around the answer are tolerated, anything else that does not parse is a
//! hard failure for that artist.

use crate::error::{EnrichError, EnrichResult};
use crate::models::{CatalogMetadata, ResearchResult};
use crate::services::rate_limiter::ServiceRateLimiter;
use artcard_common::config::ResearchConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const PERPLEXITY_CHAT_URL: &str = "https://api.perplexity.ai/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You are an expert music researcher with access to web search. \
Provide accurate, well-researched information. Always respond with valid JSON only.";

/// Web research about an artist
#[async_trait]
pub trait ResearchSource: Send + Sync {
    async fn research(&self, name: &str, catalog: &CatalogMetadata) -> EnrichResult<ResearchResult>;
}

/// User prompt for one artist, seeded with catalog context
pub fn build_prompt(name: &str, catalog: &CatalogMetadata) -> String {
    let genres = if catalog.genres.is_empty() {
        "Unknown".to_string()
    } else {
        catalog.genres.join(", ")
    };

    format!(
        r#"Research the musical artist "{name}" and provide comprehensive biographical information.

CONTEXT FROM SPOTIFY:
- Genres: {genres}
- Popularity: {popularity}

REQUIRED INFORMATION:
1. **Biography**: 2-3 flowing paragraphs covering early life, career development, musical style, and legacy

2. **Musical Connections** (be specific and accurate):
   - **Mentors/Influences**: Teachers, inspirations, stylistic influences
   - **Key Collaborators**: Band members, frequent collaborators
   - **Artists Influenced**: Students, proteges, inspired musicians

3. **Fun Facts**: 3-4 interesting anecdotes or lesser-known details

4. **Sources**: Note Wikipedia URL if available

RESPONSE FORMAT (JSON):
{{
  "biography": "2-3 paragraph biography text...",
  "connections": {{
    "mentors": [
      {{"name": "Artist Name", "context": "relationship description", "specific_works": "albums/projects", "time_period": "years"}}
    ],
    "collaborators": [
      {{"name": "Artist Name", "context": "nature of collaboration", "specific_works": "albums/bands", "time_period": "years"}}
    ],
    "influenced": [
      {{"name": "Artist Name", "context": "how they were influenced", "specific_works": "relevant works", "time_period": "years"}}
    ]
  }},
  "fun_facts": ["fact 1", "fact 2", "fact 3"],
  "wikipedia_url": "URL if found",
  "sources": ["source1", "source2"],
  "location_full": "City, State/Region, Country (birthplace for individuals, origin for bands/groups)",
  "entity_type": "individual" or "band" or "group"
}}

Only include verified information from credible sources."#,
        popularity = catalog.popularity,
    )
}

/// Remove a surrounding markdown code fence (```json ... ```)
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    inner.trim().strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the model's answer into a research result
///
/// # Errors
/// `ParseFailure` when the answer is empty or not the expected JSON object.
pub fn parse_research_response(text: &str) -> EnrichResult<ResearchResult> {
    let json = strip_code_fences(text);
    if json.is_empty() {
        return Err(EnrichError::ParseFailure(
            "empty research response".to_string(),
        ));
    }

    let mut result: ResearchResult = serde_json::from_str(json)
        .map_err(|e| EnrichError::ParseFailure(format!("research response is not valid JSON: {}", e)))?;
    result.connections.normalize();
    Ok(result)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Live Perplexity client
pub struct PerplexityClient {
    http_client: reqwest::Client,
    api_key: String,
    settings: ResearchConfig,
    rate_limiter: ServiceRateLimiter,
}

impl PerplexityClient {
    pub fn new(api_key: String, settings: ResearchConfig, rate_limit_ms: u64) -> EnrichResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Network(e.to_string()))?;

        info!(model = %settings.model, "Initialized Perplexity client");

        Ok(Self {
            http_client,
            api_key,
            settings,
            rate_limiter: ServiceRateLimiter::from_millis("perplexity", rate_limit_ms),
        })
    }
}

#[async_trait]
impl ResearchSource for PerplexityClient {
    async fn research(&self, name: &str, catalog: &CatalogMetadata) -> EnrichResult<ResearchResult> {
        let prompt = build_prompt(name, catalog);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        self.rate_limiter.acquire().await;
        info!(artist = %name, "Researching artist with Perplexity");

        let response = self
            .http_client
            .post(PERPLEXITY_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichError::Api(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                EnrichError::ParseFailure(format!("Perplexity returned no choices for '{}'", name))
            })?;

        let result = parse_research_response(&content)?;
        debug!(
            artist = %name,
            biography_chars = result.biography.len(),
            connections = result.connections.total(),
            "Research successful"
        );
        Ok(result)
    }
}

/// Offline stand-in used by dry runs: no network, no API key
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderResearch;

#[async_trait]
impl ResearchSource for PlaceholderResearch {
    async fn research(&self, name: &str, catalog: &CatalogMetadata) -> EnrichResult<ResearchResult> {
        let genres = if catalog.genres.is_empty() {
            "music".to_string()
        } else {
            catalog
                .genres
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };

        Ok(ResearchResult {
            biography: format!(
                "**{name}** is a renowned musical artist known for their contributions to {genres}. \
                 Throughout their career, they have established themselves as a significant figure \
                 in the music industry."
            ),
            fun_facts: vec![
                "Pioneering artist in their genre".to_string(),
                "Recorded numerous acclaimed albums".to_string(),
            ],
            sources: vec!["Wikipedia".to_string(), "AllMusic".to_string()],
            wikipedia_url: format!("https://en.wikipedia.org/wiki/{}", name.replace(' ', "_")),
            location_full: "United States".to_string(),
            entity_type: "individual".to_string(),
            ..Default::default()
        })
    }
}
