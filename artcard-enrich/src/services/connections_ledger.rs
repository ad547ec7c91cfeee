//! Artist-to-artist relationship ledger (`artist_connections.json`)
//!
//! One entry per researched artist, replaced wholesale each time the artist
//! is researched again. Loaded once at the start of a run and saved once at
//! the end.

use crate::error::{EnrichError, EnrichResult};
use crate::models::{ConnectionKind, Connections};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// `source` value written on research-derived entries
pub const RESEARCH_SOURCE: &str = "perplexity_research";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub mentors: Vec<String>,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub influenced: Vec<String>,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub source: String,
}

impl LedgerEntry {
    pub fn connection_count(&self) -> usize {
        self.mentors.len() + self.collaborators.len() + self.influenced.len()
    }
}

#[derive(Debug)]
pub struct ConnectionsLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl ConnectionsLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger
    ///
    /// # Errors
    /// `ParseFailure` when the file exists but is not a valid ledger, so that
    /// the run stops before it could overwrite it.
    pub fn load(path: &Path) -> EnrichResult<Self> {
        let entries = if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                EnrichError::ParseFailure(format!(
                    "Connections ledger {} is malformed: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            BTreeMap::new()
        };

        info!(ledger = %path.display(), artists = entries.len(), "Loaded connections ledger");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of artists in the ledger
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, artist: &str) -> Option<&LedgerEntry> {
        self.entries.get(artist)
    }

    /// Record (or replace) an artist's connections; returns the connection count
    pub fn record(&mut self, artist: &str, connections: &Connections, updated: String) -> usize {
        let entry = LedgerEntry {
            mentors: connections.names(ConnectionKind::Mentors),
            collaborators: connections.names(ConnectionKind::Collaborators),
            influenced: connections.names(ConnectionKind::Influenced),
            updated,
            source: RESEARCH_SOURCE.to_string(),
        };
        let count = entry.connection_count();
        self.entries.insert(artist.to_string(), entry);
        count
    }

    /// Write the ledger (pretty JSON, whole-file replace)
    ///
    /// Returns `false` in dry-run mode, where nothing is written.
    pub fn save(&self, dry_run: bool) -> EnrichResult<bool> {
        if dry_run {
            info!(artists = self.entries.len(), "[DRY RUN] Would save connections ledger");
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| EnrichError::ParseFailure(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            warn!(error = %e, "Failed to replace connections ledger");
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(artists = self.entries.len(), "Saved connections ledger");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Connection;

    fn connections() -> Connections {
        let named = |name: &str| Connection {
            name: name.to_string(),
            ..Default::default()
        };
        Connections {
            mentors: vec![named("Professor Longhair")],
            collaborators: vec![named("Allen Toussaint"), named("The Meters")],
            influenced: Vec::new(),
        }
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ConnectionsLedger::load(&dir.path().join("artist_connections.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_malformed_ledger_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artist_connections.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ConnectionsLedger::load(&path),
            Err(EnrichError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_record_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artist_connections.json");

        let mut ledger = ConnectionsLedger::load(&path).unwrap();
        let count = ledger.record("Dr. John", &connections(), "2024-03-01T12:00:00Z".to_string());
        assert_eq!(count, 3);
        assert!(ledger.save(false).unwrap());

        let reloaded = ConnectionsLedger::load(&path).unwrap();
        let entry = reloaded.get("Dr. John").unwrap();
        assert_eq!(entry.collaborators, vec!["Allen Toussaint", "The Meters"]);
        assert_eq!(entry.source, RESEARCH_SOURCE);
    }

    #[test]
    fn test_existing_entries_survive_and_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artist_connections.json");
        std::fs::write(
            &path,
            r#"{"Irma Thomas": {"mentors": [], "collaborators": ["Allen Toussaint"], "influenced": [], "updated": "2023-01-01", "source": "perplexity_research"},
                "Dr. John": {"mentors": ["Old"], "updated": "2023-01-01", "source": "perplexity_research"}}"#,
        )
        .unwrap();

        let mut ledger = ConnectionsLedger::load(&path).unwrap();
        ledger.record("Dr. John", &connections(), "2024-03-01T12:00:00Z".to_string());
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("Dr. John").unwrap().mentors, vec!["Professor Longhair"]);
        assert_eq!(ledger.get("Irma Thomas").unwrap().collaborators.len(), 1);
    }

    #[test]
    fn test_dry_run_save_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artist_connections.json");
        let mut ledger = ConnectionsLedger::load(&path).unwrap();
        ledger.record("Dr. John", &connections(), "now".to_string());
        assert!(!ledger.save(true).unwrap());
        assert!(!path.exists());
    }
}
