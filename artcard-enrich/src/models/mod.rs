//! Data models exchanged between the clients, the card builder and the workflows

pub mod catalog;
pub mod encyclopedia;
pub mod research;

pub use catalog::CatalogMetadata;
pub use encyclopedia::{EncyclopediaMatch, LifeSpan, MemberEntry};
pub use research::{Connection, ConnectionKind, Connections, ResearchResult};

use serde::{Deserialize, Deserializer};

/// Person-vs-group classification used for card layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    /// A single person (Quick Info shows "Born", cards list associated acts)
    Individual,
    /// A band, group, orchestra or choir (Quick Info shows "Origin", cards list members)
    Group,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Group => "group",
        }
    }
}

/// Treat an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
