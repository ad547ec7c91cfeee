//! Research (web-search AI) results

use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Confidence assigned to research connections that do not carry one
pub const DEFAULT_CONNECTION_CONFIDENCE: f64 = 0.95;

/// A relationship between the researched artist and another artist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specific_works: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Where the connection came from when not from research (e.g. `musicbrainz`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Mentors,
    Collaborators,
    Influenced,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 3] = [
        ConnectionKind::Mentors,
        ConnectionKind::Collaborators,
        ConnectionKind::Influenced,
    ];

    /// Key used in front matter and in the ledger
    pub fn key(&self) -> &'static str {
        match self {
            ConnectionKind::Mentors => "mentors",
            ConnectionKind::Collaborators => "collaborators",
            ConnectionKind::Influenced => "influenced",
        }
    }

    /// Card body sub-heading
    pub fn heading(&self) -> &'static str {
        match self {
            ConnectionKind::Mentors => "Mentors/Influences",
            ConnectionKind::Collaborators => "Key Collaborators",
            ConnectionKind::Influenced => "Artists Influenced",
        }
    }
}

/// Connections grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default, deserialize_with = "null_as_default")]
    pub mentors: Vec<Connection>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collaborators: Vec<Connection>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub influenced: Vec<Connection>,
}

impl Connections {
    pub fn of_kind(&self, kind: ConnectionKind) -> &[Connection] {
        match kind {
            ConnectionKind::Mentors => &self.mentors,
            ConnectionKind::Collaborators => &self.collaborators,
            ConnectionKind::Influenced => &self.influenced,
        }
    }

    /// Names of one kind, in order
    pub fn names(&self, kind: ConnectionKind) -> Vec<String> {
        self.of_kind(kind).iter().map(|c| c.name.clone()).collect()
    }

    pub fn total(&self) -> usize {
        self.mentors.len() + self.collaborators.len() + self.influenced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Drop nameless entries and fill in the default confidence
    pub fn normalize(&mut self) {
        for list in [&mut self.mentors, &mut self.collaborators, &mut self.influenced] {
            list.retain(|c| !c.name.trim().is_empty());
            for connection in list.iter_mut() {
                connection.name = connection.name.trim().to_string();
                if connection.confidence.is_none() {
                    connection.confidence = Some(DEFAULT_CONNECTION_CONFIDENCE);
                }
            }
        }
    }
}

/// Parsed research response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub biography: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Connections,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fun_facts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wikipedia_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_full: String,
    /// Free-text guess ("individual", "band", "group", ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub entity_type: String,
}
