//! Core data types for the Marquee poster extraction pipeline.
//!
//! This crate provides the foundation data types used across all Marquee
//! interfaces: poster taxonomy, phase results, consensus outputs, and the
//! assembled entity/relation graph shapes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod consensus;
mod entity;
mod graph;
mod image;
mod options;
mod phase;
mod poster_type;
mod response;
mod result;
mod telemetry;

pub use consensus::{ConsensusOptions, ConsensusResult, FieldConsensus, ProviderOutput};
pub use entity::{PosterEntity, ProcessingMetadata};
pub use graph::{
    AssemblyResult, EntityKind, EntityRecord, GraphEntity, GraphRelation, RelationKind,
    RelationRecord, deterministic_name, show_name,
};
pub use image::ImageRef;
pub use options::{ProcessingOptions, ProcessingOptionsBuilder};
pub use phase::{
    ArtistMatch, ArtistPayload, AssemblyStats, CatalogKind, CatalogMatch, EnrichmentPayload,
    EventPayload, FieldCorrection, PhaseOutcome, PhaseResult, PhaseStatus, ReviewPayload,
    ShowDate, TypePayload, VenuePayload,
};
pub use poster_type::{PosterType, TypeInference};
pub use response::{ExtractionResponse, ProviderUsage};
pub use result::{BatchResult, PhaseLog, ProcessingResult};
pub use telemetry::init_telemetry;
