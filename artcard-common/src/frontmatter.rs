//! Artist card documents: YAML front matter + markdown body
//!
//! A card on disk looks like:
//!
//! ```text
//! ---
//! title: Dr. John
//! enhancement_provider: perplexity
//! ---
//!
//! # Dr. John
//! ...
//! ```
//!
//! The front matter is kept as an ordered [`serde_yaml::Mapping`] so that
//! in-place edits (backfill, instrument repair) preserve keys this crate does
//! not know about, in their original order. The body is kept verbatim,
//! including the newline(s) that follow the closing delimiter.

use crate::{Error, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";

/// Parsed artist card
#[derive(Debug, Clone, PartialEq)]
pub struct CardDocument {
    /// Front matter fields in document order
    pub front_matter: Mapping,
    /// Markdown body following the closing `---` line (verbatim)
    pub body: String,
}

impl CardDocument {
    pub fn new(front_matter: Mapping, body: impl Into<String>) -> Self {
        Self {
            front_matter,
            body: body.into(),
        }
    }

    /// Build a document from a typed front matter struct
    pub fn from_serializable<T: Serialize>(front_matter: &T, body: impl Into<String>) -> Result<Self> {
        match serde_yaml::to_value(front_matter)? {
            Value::Mapping(mapping) => Ok(Self::new(mapping, body)),
            other => Err(Error::InvalidDocument(format!(
                "front matter must serialize to a mapping, got {:?}",
                other
            ))),
        }
    }

    /// Split a card into front matter and body
    ///
    /// # Errors
    /// `InvalidDocument` when the content does not open with a `---` line,
    /// the closing delimiter is missing, or the YAML is not a mapping.
    pub fn parse(content: &str) -> Result<Self> {
        let rest = content
            .strip_prefix(DELIMITER)
            .ok_or_else(|| Error::InvalidDocument("no front matter found".to_string()))?;
        let rest = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .ok_or_else(|| Error::InvalidDocument("malformed front matter opening".to_string()))?;

        let (yaml, body) = if let Some(body) = rest.strip_prefix(DELIMITER) {
            ("", body)
        } else {
            let close = rest
                .find("\n---")
                .ok_or_else(|| Error::InvalidDocument("unterminated front matter".to_string()))?;
            (&rest[..=close], &rest[close + 1 + DELIMITER.len()..])
        };

        let front_matter = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Error::InvalidDocument(
                    "front matter is not a mapping".to_string(),
                ))
            }
        };

        Ok(Self::new(front_matter, body))
    }

    /// Render back to `---\n<yaml>---<body>`
    pub fn render(&self) -> Result<String> {
        let yaml = if self.front_matter.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(&self.front_matter)?
        };
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}{}", self.body))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.front_matter.get(key)
    }

    /// String value of a top-level key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// List of strings under a top-level key; `None` when absent or not a sequence
    ///
    /// Non-string items are skipped.
    pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).and_then(Value::as_sequence).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
    }

    /// True when the key exists with a non-empty value
    ///
    /// `null`, `false`, `""`, `0`, `[]` and `{}` all count as empty.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_populated)
    }

    /// Insert or replace a top-level key
    pub fn set<V: Serialize>(&mut self, key: &str, value: V) -> Result<()> {
        self.front_matter
            .insert(Value::from(key), serde_yaml::to_value(value)?);
        Ok(())
    }

    /// Insert a top-level key only when it is currently empty
    ///
    /// Returns whether the value was written.
    pub fn set_if_empty<V: Serialize>(&mut self, key: &str, value: V) -> Result<bool> {
        if self.has_value(key) {
            return Ok(false);
        }
        self.set(key, value)?;
        Ok(true)
    }

    /// Insert or replace `parent.key`, creating `parent` as a mapping if needed
    pub fn set_nested<V: Serialize>(&mut self, parent: &str, key: &str, value: V) -> Result<()> {
        let value = serde_yaml::to_value(value)?;
        let parent_key = Value::from(parent);
        match self.front_matter.get_mut(&parent_key) {
            Some(Value::Mapping(mapping)) => {
                mapping.insert(Value::from(key), value);
            }
            _ => {
                let mut mapping = Mapping::new();
                mapping.insert(Value::from(key), value);
                self.front_matter.insert(parent_key, Value::Mapping(mapping));
            }
        }
        Ok(())
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(mapping) => !mapping.is_empty(),
        Value::Tagged(tagged) => is_populated(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "---\ntitle: Dr. John\ngenres:\n- new orleans blues\n- piano blues\nenhancement_provider: perplexity\n---\n\n# Dr. John\n\nBody text.\n";

    #[test]
    fn test_parse_splits_front_matter_and_body() {
        let doc = CardDocument::parse(CARD).unwrap();
        assert_eq!(doc.get_str("title"), Some("Dr. John"));
        assert_eq!(
            doc.get_str_list("genres"),
            Some(vec!["new orleans blues".to_string(), "piano blues".to_string()])
        );
        assert_eq!(doc.body, "\n\n# Dr. John\n\nBody text.\n");
    }

    #[test]
    fn test_render_round_trips_body_and_key_order() {
        let doc = CardDocument::parse(CARD).unwrap();
        assert_eq!(doc.render().unwrap(), CARD);
    }

    #[test]
    fn test_missing_front_matter_is_rejected() {
        assert!(matches!(
            CardDocument::parse("# Just markdown\n"),
            Err(Error::InvalidDocument(_))
        ));
        assert!(matches!(
            CardDocument::parse("---\ntitle: never closed\n"),
            Err(Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_dashes_inside_values_do_not_close_front_matter() {
        let doc = CardDocument::parse("---\ntitle: a---b\n---\nbody").unwrap();
        assert_eq!(doc.get_str("title"), Some("a---b"));
        assert_eq!(doc.body, "\nbody");
    }

    #[test]
    fn test_has_value_treats_empty_as_absent() {
        let doc = CardDocument::parse(
            "---\ngender: ''\naliases: []\nbirth_date: '1941-11-20'\nnetwork_extracted: true\n---\n",
        )
        .unwrap();
        assert!(!doc.has_value("gender"));
        assert!(!doc.has_value("aliases"));
        assert!(!doc.has_value("death_date"));
        assert!(doc.has_value("birth_date"));
        assert!(doc.has_value("network_extracted"));
    }

    #[test]
    fn test_set_if_empty_never_overwrites() {
        let mut doc = CardDocument::parse("---\ngender: Male\n---\n").unwrap();
        assert!(!doc.set_if_empty("gender", "Female").unwrap());
        assert!(doc.set_if_empty("artist_type", "person").unwrap());
        assert_eq!(doc.get_str("gender"), Some("Male"));
        assert_eq!(doc.get_str("artist_type"), Some("person"));
    }

    #[test]
    fn test_set_nested_creates_parent() {
        let mut doc = CardDocument::parse("---\ntitle: X\n---\n").unwrap();
        doc.set_nested("external_urls", "musicbrainz", "https://musicbrainz.org/artist/1")
            .unwrap();
        doc.set_nested("external_urls", "spotify", "https://open.spotify.com/artist/2")
            .unwrap();
        let urls = doc.get("external_urls").and_then(Value::as_mapping).unwrap();
        assert_eq!(urls.len(), 2);
    }
}
