//! Streaming catalog snapshot

use serde::{Deserialize, Serialize};

/// Canonical catalog metadata for one artist, fetched fresh on every run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Catalog artist ID
    pub id: String,
    /// Catalog display name
    pub name: String,
    /// Genre labels, most specific first as returned by the catalog
    pub genres: Vec<String>,
    /// Popularity 0-100
    pub popularity: u32,
    /// Follower count
    pub followers: u64,
    /// Public profile URL
    pub profile_url: String,
    /// First (largest) profile image, if any
    pub image_url: Option<String>,
}
