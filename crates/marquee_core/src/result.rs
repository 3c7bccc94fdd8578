//! Top-level processing results.

use crate::{AssemblyResult, ConsensusResult, PhaseResult, PhaseStatus, PosterEntity};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The per-phase record gathered during one run.
///
/// Slots fill in pipeline order; on failure the record holds whatever was
/// produced before the run stopped, so callers can always inspect partial
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PhaseLog {
    /// Type classification result
    pub type_phase: Option<PhaseResult>,
    /// Artist extraction result
    pub artist: Option<PhaseResult>,
    /// Venue extraction result
    pub venue: Option<PhaseResult>,
    /// Event extraction result
    pub event: Option<PhaseResult>,
    /// Assembly result
    pub assembly: Option<PhaseResult>,
    /// Enrichment result
    pub enrichment: Option<PhaseResult>,
    /// Review result
    pub review: Option<PhaseResult>,
}

impl PhaseLog {
    /// Iterate over the phases that actually ran, in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = &PhaseResult> {
        [
            self.type_phase.as_ref(),
            self.artist.as_ref(),
            self.venue.as_ref(),
            self.event.as_ref(),
            self.assembly.as_ref(),
            self.enrichment.as_ref(),
            self.review.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether any phase flagged its output for review.
    pub fn needs_review(&self) -> bool {
        self.iter()
            .any(|p| p.outcome().status == PhaseStatus::NeedsReview)
    }
}

/// Unified result of processing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Whether the run completed
    pub success: bool,
    /// Failure description, when the run did not complete
    pub error: Option<String>,
    /// Poster identifier (image content hash), when the image was readable
    pub poster_id: Option<String>,
    /// Processing session identifier
    pub session_id: Option<String>,
    /// Per-phase record, partial on failure
    pub phases: PhaseLog,
    /// The assembled entity, when processing got that far
    pub entity: Option<PosterEntity>,
    /// Assembly ledger, when assembly ran
    pub assembly: Option<AssemblyResult>,
    /// Consensus audit record, when consensus ran
    pub consensus: Option<ConsensusResult>,
    /// Total wall-clock time
    pub elapsed: Duration,
}

impl ProcessingResult {
    /// A failed result with no phases attempted.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            poster_id: None,
            session_id: None,
            phases: PhaseLog::default(),
            entity: None,
            assembly: None,
            consensus: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Aggregate result of processing a batch of images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BatchResult {
    /// Per-image results, in input order
    pub results: Vec<ProcessingResult>,
    /// Count of successful runs
    pub succeeded: usize,
    /// Count of failed runs
    pub failed: usize,
    /// Count of successful runs with at least one needs-review phase
    pub needs_review: usize,
    /// Total wall-clock time including inter-image delays
    pub elapsed: Duration,
}
