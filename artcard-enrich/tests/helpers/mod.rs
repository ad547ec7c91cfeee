//! Test Helper Utilities
//!
//! Shared fakes and fixtures for artcard-enrich integration tests

#![allow(dead_code)]

pub mod cards;
pub mod fakes;

// Re-export commonly used items
pub use cards::{card_names, read_card, write_card, ENHANCED_CARD};
pub use fakes::{
    catalog_entry, detail, research_with_collaborators, FakeCatalog, FakeEncyclopedia,
    FakeResearch,
};
