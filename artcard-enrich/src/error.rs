//! Error types for artcard-enrich
//!
//! Severity is decided by the caller, not the variant:
//! - `NotFound` / `LowConfidence` from the encyclopedia degrade a card
//!   (built without that data); from the catalog they fail the artist.
//! - `ParseFailure` / `Io` fail the current artist only.
//! - `Configuration` fails the whole run before any artist is processed.

use thiserror::Error;

/// Pipeline error taxonomy
#[derive(Debug, Error)]
pub enum EnrichError {
    /// No match from an external source
    #[error("Not found: {0}")]
    NotFound(String),

    /// Encyclopedia match below the acceptance threshold
    #[error("Low confidence match ({confidence}%) for '{name}' -> '{candidate}' (threshold: {threshold}%)")]
    LowConfidence {
        name: String,
        candidate: String,
        confidence: u8,
        threshold: u8,
    },

    /// Token rejected again after a fresh re-authentication
    #[error("Authentication failed: {0}")]
    TransientAuthFailure(String),

    /// Malformed or empty external response
    #[error("Parse error: {0}")]
    ParseFailure(String),

    /// Card, ledger or image I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing credential or unusable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Unexpected HTTP status from an external API
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Error from artcard-common (front matter, config)
    #[error(transparent)]
    Common(#[from] artcard_common::Error),
}

impl EnrichError {
    /// Whether this error only means "no usable data" rather than a fault
    pub fn is_no_match(&self) -> bool {
        matches!(self, EnrichError::NotFound(_) | EnrichError::LowConfidence { .. })
    }
}

impl From<reqwest::Error> for EnrichError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EnrichError::ParseFailure(err.to_string())
        } else {
            EnrichError::Network(err.to_string())
        }
    }
}

/// Result type for pipeline operations
pub type EnrichResult<T> = Result<T, EnrichError>;
