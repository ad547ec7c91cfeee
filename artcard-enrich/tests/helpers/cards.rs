//! Card folder fixtures

use artcard_common::CardDocument;
use std::path::Path;

/// A card that has already been through research
pub const ENHANCED_CARD: &str = "---
title: Professor Longhair
enhancement_provider: perplexity
entry_created: '2023-01-01T00:00:00Z'
---

# Professor Longhair
";

pub fn write_card(dir: &Path, file_name: &str, content: &str) {
    std::fs::write(dir.join(file_name), content).unwrap();
}

pub fn read_card(dir: &Path, file_name: &str) -> CardDocument {
    let content = std::fs::read_to_string(dir.join(file_name)).unwrap();
    CardDocument::parse(&content).unwrap()
}

/// Markdown files in `dir`, sorted
pub fn card_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".md"))
        .collect();
    names.sort();
    names
}
