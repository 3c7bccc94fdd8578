//! Graph entity and relation shapes, plus deterministic naming.
//!
//! Entity names are pure functions of canonical attributes: lowercase the
//! text and strip everything non-alphanumeric. Re-running assembly against an
//! existing graph therefore finds prior entities instead of duplicating them.

use crate::PosterEntity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of graph entity the assembler creates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum EntityKind {
    /// The poster record itself
    Poster,
    /// Performing artist or band
    Artist,
    /// Physical venue
    Venue,
    /// Event advertised by the poster
    Event,
    /// One dated performance within an event
    Show,
    /// Album or release
    Album,
    /// Film
    Film,
    /// Person (director, cast)
    Person,
    /// Record label or promoter
    Organization,
    /// Taxonomy node for a poster type
    PosterType,
}

/// Kinds of graph relation the assembler creates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// Poster -> PosterType, with confidence and primary flag
    HasType,
    /// Poster -> Event
    Promotes,
    /// Event -> Venue
    HeldAt,
    /// Show -> Event
    PartOf,
    /// Artist -> Show, with billing order
    PerformsIn,
    /// Album -> Artist
    CreatedBy,
    /// Album -> Organization (label)
    ReleasedBy,
    /// Film -> Person (director)
    DirectedBy,
    /// Film -> Person (cast member)
    Stars,
}

/// An entity to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    /// Entity kind
    pub kind: EntityKind,
    /// Deterministic name (see [`deterministic_name`])
    pub name: String,
    /// Human-readable name as extracted
    pub display_name: String,
    /// Arbitrary properties
    pub properties: Map<String, Value>,
}

/// A relation to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelation {
    /// Relation kind
    pub kind: RelationKind,
    /// Deterministic name of the source entity
    pub from: String,
    /// Deterministic name of the target entity
    pub to: String,
    /// Arbitrary properties (confidence, billing order, ...)
    pub properties: Map<String, Value>,
}

/// Dedup-ledger entry for one entity touched during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity kind
    pub kind: EntityKind,
    /// Deterministic name
    pub name: String,
    /// False when the entity already existed before this run
    pub is_new: bool,
}

/// Dedup-ledger entry for one relation recorded during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Relation kind
    pub kind: RelationKind,
    /// Source entity name
    pub from: String,
    /// Target entity name
    pub to: String,
}

/// Outcome of a graph assembly run.
///
/// The ledgers are append-only records of what the run touched, not a command
/// log: re-running assembly against the same store state yields the same
/// names with `is_new` all false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// The merged poster entity the graph was built from
    pub entity: PosterEntity,
    /// Entities touched, in creation order
    pub entities_created: Vec<EntityRecord>,
    /// Relations recorded, in creation order
    pub relationships_created: Vec<RelationRecord>,
    /// Sub-step errors that were caught and skipped
    pub errors: Vec<String>,
}

impl AssemblyResult {
    /// Count of entities that did not exist before this run.
    pub fn newly_created(&self) -> usize {
        self.entities_created.iter().filter(|e| e.is_new).count()
    }
}

/// Derive a deterministic entity name from canonical text.
///
/// Lowercases and strips everything that is not alphanumeric, so that
/// "The Tivoli", "the tivoli " and "The Tivoli!" collide on purpose.
///
/// # Examples
///
/// ```
/// use marquee_core::deterministic_name;
///
/// assert_eq!(deterministic_name("The Tivoli"), "thetivoli");
/// assert_eq!(deterministic_name("  Björk & Friends "), "björkfriends");
/// ```
pub fn deterministic_name(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Deterministic name for a time-bound show entity.
///
/// Shows need a disambiguating suffix because the same artist can play the
/// same venue on different nights.
///
/// # Examples
///
/// ```
/// use marquee_core::show_name;
///
/// let name = show_name("The National", "Riverside Theater", "20240614");
/// assert_eq!(name, "show-thenational-riversidetheater-20240614");
/// ```
pub fn show_name(artist: &str, venue: &str, date_slug: &str) -> String {
    format!(
        "show-{}-{}-{}",
        deterministic_name(artist),
        deterministic_name(venue),
        date_slug
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_name_is_case_and_punctuation_insensitive() {
        assert_eq!(
            deterministic_name("The Tivoli"),
            deterministic_name("THE TIVOLI!!!")
        );
        assert_eq!(deterministic_name(" A.B.C. "), "abc");
    }

    #[test]
    fn deterministic_name_empty_for_pure_punctuation() {
        assert_eq!(deterministic_name("-- // --"), "");
    }

    #[test]
    fn show_names_disambiguate_by_date() {
        let a = show_name("X", "Tivoli", "20240101");
        let b = show_name("X", "Tivoli", "20240102");
        assert_ne!(a, b);
    }
}
