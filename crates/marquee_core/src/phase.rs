//! Phase result types.
//!
//! Each extraction phase produces a typed payload plus a shared outcome
//! (status, confidence, timing). The tagged union keeps the orchestrator and
//! assembly boundaries exhaustive: a payload field cannot be silently dropped
//! when handed between phases.

use crate::{PosterType, TypeInference};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal status of one phase execution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseStatus {
    /// Phase produced output above its confidence threshold
    Completed,
    /// Output produced but flagged for manual review
    NeedsReview,
    /// Phase produced no usable output
    Failed,
}

/// Shared outcome fields carried by every phase result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Terminal status
    pub status: PhaseStatus,
    /// Aggregate confidence in [0, 1]
    pub confidence: f32,
    /// Wall-clock processing time
    pub elapsed: Duration,
}

impl PhaseOutcome {
    /// Build an outcome, clamping confidence into [0, 1].
    pub fn new(status: PhaseStatus, confidence: f32, elapsed: Duration) -> Self {
        Self {
            status,
            confidence: confidence.clamp(0.0, 1.0),
            elapsed,
        }
    }

    /// A failed outcome with zero confidence.
    pub fn failed(elapsed: Duration) -> Self {
        Self::new(PhaseStatus::Failed, 0.0, elapsed)
    }
}

/// Payload of the type classification phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TypePayload {
    /// Primary classification
    pub poster_type: PosterType,
    /// Alternate inferences (hybrid posters carry more than one)
    pub alternates: Vec<TypeInference>,
    /// Full text the model read off the poster, reused by later phases
    /// to avoid re-OCR
    pub extracted_text: Option<String>,
}

/// One matched performer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistMatch {
    /// Performer name as printed on the poster
    pub name: String,
    /// External registry identifier (e.g. MusicBrainz), when resolved
    pub registry_id: Option<String>,
    /// Match confidence in [0, 1]
    pub confidence: f32,
}

/// Payload of the artist extraction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArtistPayload {
    /// Top-billed performer
    pub headliner: Option<ArtistMatch>,
    /// Supporting acts in billing order, deduplicated case-insensitively
    pub supporting: Vec<ArtistMatch>,
}

/// Payload of the venue extraction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VenuePayload {
    /// Venue name
    pub name: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
}

/// A single show date with tolerant parsing.
///
/// The raw text is always kept; year/month/day are filled only when the
/// pattern check succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDate {
    /// Date text as printed on the poster
    pub raw: String,
    /// Parsed year, when recognized
    pub year: Option<i32>,
    /// Parsed month (1-12), when recognized
    pub month: Option<u32>,
    /// Parsed day of month, when recognized
    pub day: Option<u32>,
    /// Per-date confidence in [0, 1]
    pub confidence: f32,
}

impl ShowDate {
    /// ISO-ish slug for deterministic show naming; falls back to the raw
    /// text when parsing was incomplete.
    pub fn slug(&self) -> String {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => format!("{y:04}{m:02}{d:02}"),
            _ => crate::deterministic_name(&self.raw),
        }
    }
}

/// Payload of the event extraction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventPayload {
    /// Event title, when distinct from the headliner
    pub title: Option<String>,
    /// One or more show dates
    pub dates: Vec<ShowDate>,
    /// Ticket price text, when printed
    pub ticket_price: Option<String>,
}

/// What kind of catalog entry an enrichment match refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CatalogKind {
    /// Discography entry
    Album,
    /// Filmography entry
    Film,
}

/// One enrichment match from an external reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMatch {
    /// Artist or person the catalog was queried for
    pub artist: String,
    /// Matched title
    pub title: String,
    /// Catalog kind
    pub kind: CatalogKind,
    /// Which reference source produced the match
    pub source: String,
}

/// Payload of the best-effort enrichment phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnrichmentPayload {
    /// Catalog matches, at most three per artist
    pub matches: Vec<CatalogMatch>,
    /// Whether a reference lookup collaborator was available at all
    pub lookup_available: bool,
}

/// One field-level correction from the review phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCorrection {
    /// Field name on the draft entity
    pub field: String,
    /// Value the reviewer saw
    pub current_value: Option<String>,
    /// Corrected value; `None` means the field should be cleared
    pub corrected_value: Option<String>,
    /// Reviewer confidence in [0, 1]; corrections below 0.5 are not applied
    pub confidence: f32,
    /// Short explanation, when given
    pub reason: Option<String>,
}

/// Payload of the self-review phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReviewPayload {
    /// Whether the reviewer passed the draft overall
    pub passed: bool,
    /// Reviewer's overall confidence in [0, 1]
    pub confidence: f32,
    /// Field-level corrections
    pub corrections: Vec<FieldCorrection>,
    /// Fields flagged for manual review
    pub flagged_fields: Vec<String>,
}

/// Ledger counts from an assembly run, carried in the phase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssemblyStats {
    /// Entities touched by the run (created or found)
    pub entities: usize,
    /// Relations recorded by the run
    pub relations: usize,
    /// Entities that were newly created (absent before the run)
    pub newly_created: usize,
}

/// Result of one pipeline phase.
///
/// The variant is the phase identity; exhaustive matching at the orchestrator
/// and assembly boundaries is deliberate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseResult {
    /// Poster type classification
    Type {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Classification payload
        payload: TypePayload,
    },
    /// Artist extraction
    Artist {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Artist payload
        payload: ArtistPayload,
    },
    /// Venue extraction
    Venue {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Venue payload
        payload: VenuePayload,
    },
    /// Event/date extraction
    Event {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Event payload
        payload: EventPayload,
    },
    /// Graph assembly
    Assembly {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Ledger counts
        payload: AssemblyStats,
    },
    /// Reference-catalog enrichment
    Enrichment {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Enrichment payload
        payload: EnrichmentPayload,
    },
    /// Self-review
    Review {
        /// Shared outcome fields
        outcome: PhaseOutcome,
        /// Review payload
        payload: ReviewPayload,
    },
}

impl PhaseResult {
    /// Shared outcome of this phase.
    pub fn outcome(&self) -> &PhaseOutcome {
        match self {
            Self::Type { outcome, .. }
            | Self::Artist { outcome, .. }
            | Self::Venue { outcome, .. }
            | Self::Event { outcome, .. }
            | Self::Assembly { outcome, .. }
            | Self::Enrichment { outcome, .. }
            | Self::Review { outcome, .. } => outcome,
        }
    }

    /// Stable phase name for logging and context provenance.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Type { .. } => "type",
            Self::Artist { .. } => "artist",
            Self::Venue { .. } => "venue",
            Self::Event { .. } => "event",
            Self::Assembly { .. } => "assembly",
            Self::Enrichment { .. } => "enrichment",
            Self::Review { .. } => "review",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_clamps_confidence() {
        let outcome = PhaseOutcome::new(PhaseStatus::Completed, 1.7, Duration::ZERO);
        assert_eq!(outcome.confidence, 1.0);
        let outcome = PhaseOutcome::new(PhaseStatus::Completed, -0.2, Duration::ZERO);
        assert_eq!(outcome.confidence, 0.0);
    }

    #[test]
    fn show_date_slug_prefers_parsed_parts() {
        let date = ShowDate {
            raw: "Fri 14 June 2024".to_string(),
            year: Some(2024),
            month: Some(6),
            day: Some(14),
            confidence: 0.9,
        };
        assert_eq!(date.slug(), "20240614");
    }

    #[test]
    fn show_date_slug_falls_back_to_raw() {
        let date = ShowDate {
            raw: "New Year's Eve".to_string(),
            year: None,
            month: None,
            day: None,
            confidence: 0.4,
        };
        assert_eq!(date.slug(), "newyearseve");
    }

    #[test]
    fn phase_result_names_are_stable() {
        let result = PhaseResult::Venue {
            outcome: PhaseOutcome::failed(Duration::ZERO),
            payload: VenuePayload::default(),
        };
        assert_eq!(result.name(), "venue");
        assert_eq!(result.outcome().status, PhaseStatus::Failed);
    }
}
