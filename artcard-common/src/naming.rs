//! Card filename sanitisation and name normalisation
//!
//! Three different normalisations are in play:
//! - [`sanitize_filename`]: the card's on-disk identity (`<sanitized>.md`)
//!   and the target of `[[wikilinks]]`.
//! - [`normalize_key`]: alphanumeric-only key used to detect existing cards
//!   that differ only by case or punctuation.
//! - [`normalize_person_name`]: loose comparison key for collaborator names.

/// Maximum length (in characters) of a sanitised filename stem
const MAX_FILENAME_CHARS: usize = 200;

/// Sanitise an artist name into a lowercase filename stem
///
/// Case and punctuation variants of the same name collapse to one stem:
/// "DR. JOHN", "Dr. John" and "dr john" all become `dr_john`. A name with no
/// usable characters ("!!!") becomes `artist_` plus the hex code points of
/// the trimmed name; a blank name stays empty.
pub fn sanitize_filename(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('&', " and ");

    let mut sanitized = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '_' {
            if !sanitized.is_empty() && !sanitized.ends_with('_') {
                sanitized.push('_');
            }
        } else if ch.is_alphanumeric() || ch == '-' {
            sanitized.push(ch);
        }
    }

    let trimmed = sanitized.trim_matches('_');
    let stem = trimmed
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect::<String>()
        .trim_end_matches('_')
        .to_string();
    if !stem.is_empty() {
        return stem;
    }

    let code_points: String = name.trim().chars().map(|c| format!("{:x}", c as u32)).collect();
    if code_points.is_empty() {
        String::new()
    } else {
        format!("artist_{}", code_points)
    }
}

/// Alphanumeric-only lowercase key for duplicate detection
///
/// `DR._JOHN` and `dr_john` share the key `drjohn`.
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Comparison key for person/act names (lowercased, trimmed, periods and commas removed)
pub fn normalize_person_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['.', ','], "")
}

/// Obsidian wikilink to an artist card: `[[sanitized|Display Name]]`
pub fn wikilink(name: &str) -> String {
    format!("[[{}|{}]]", sanitize_filename(name), name)
}
