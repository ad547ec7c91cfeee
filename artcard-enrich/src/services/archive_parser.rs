//! Radio playlist archive parser
//!
//! The archive is a markdown table, one row per played track:
//!
//! ```text
//! | Time | Artist | Song | Album | Label | Year | Spotify | Status |
//! |:-----|:-------|:-----|:------|:------|:-----|:--------|:-------|
//! | 9:00 PM | Professor Longhair | Tipitina | ... | ✅ Found |
//! ```
//!
//! Splitting a row on `|` yields an empty leading cell, so the artist sits in
//! cell 2 and the lookup status in cell 8.

use crate::error::{EnrichError, EnrichResult};
use std::path::Path;
use tracing::{debug, info};

/// Status marker for rows whose artist was found in the catalog
pub const FOUND_STATUS: &str = "✅ Found";

const MIN_COLUMNS: usize = 9;
const ARTIST_COLUMN: usize = 2;
const STATUS_COLUMN: usize = 8;

/// Extract artist names from archive content, in file order
///
/// Lines that do not start with `|`, header, separator, short and
/// non-found rows are skipped. Names are
/// returned once per row; deduplication is left to the caller.
pub fn parse_archive(content: &str) -> Vec<String> {
    content.lines().filter_map(parse_row).collect()
}

fn parse_row(line: &str) -> Option<String> {
    if !line.trim_start().starts_with('|') {
        return None;
    }
    let columns: Vec<&str> = line.split('|').map(str::trim).collect();
    if columns.len() < MIN_COLUMNS {
        return None;
    }

    let first = columns[1];
    if first.is_empty() || first == "Time" || first.starts_with(":--") {
        return None;
    }

    let artist = columns[ARTIST_COLUMN];
    if artist.is_empty() || columns[STATUS_COLUMN] != FOUND_STATUS {
        return None;
    }

    Some(artist.to_string())
}

/// Read and parse an archive file
///
/// # Errors
/// `Configuration` when the file does not exist; `Io` on read failure.
pub fn load_archive(path: &Path) -> EnrichResult<Vec<String>> {
    if !path.is_file() {
        return Err(EnrichError::Configuration(format!(
            "Archive file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let artists = parse_archive(&content);
    debug!(rows = content.lines().count(), "Parsed archive table");
    info!(
        archive = %path.display(),
        artists = artists.len(),
        "Loaded found artists from archive"
    );
    Ok(artists)
}
