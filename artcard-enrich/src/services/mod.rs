//! Service modules for the enrichment pipeline
//!
//! External sources sit behind traits (`CatalogSource`, `EncyclopediaSource`,
//! `ResearchSource`) so workflows can run against live clients or fakes.

pub mod archive_parser;
pub mod card_builder;
pub mod card_store;
pub mod catalog_client;
pub mod connections_ledger;
pub mod encyclopedia_client;
pub mod encyclopedia_matcher;
pub mod image_store;
pub mod rate_limiter;
pub mod research_client;

pub use card_store::{CardLookup, CardStore};
pub use catalog_client::{CatalogSource, SpotifyClient};
pub use connections_ledger::ConnectionsLedger;
pub use encyclopedia_client::{EncyclopediaSource, MusicBrainzClient};
pub use encyclopedia_matcher::{EncyclopediaMatcher, MIN_CONFIDENCE};
pub use image_store::ImageStore;
pub use rate_limiter::ServiceRateLimiter;
pub use research_client::{PerplexityClient, PlaceholderResearch, ResearchSource};
