//! Multi-phase, multi-model consensus extraction pipeline for event posters.
//!
//! A poster image flows through specialized extraction phases (type, artist,
//! venue, event), optionally preceded by a cross-provider consensus pass,
//! followed by type-dispatched graph assembly, best-effort enrichment, and a
//! self-review correction step. Each run owns its own processing context, so
//! arbitrarily many images can be processed concurrently.
//!
//! The pipeline only talks to the outside world through the seams in
//! `marquee_interface`: vision extraction providers and entity/relation
//! persistence. Graph writes are idempotent by construction; entity names are
//! pure functions of normalized text.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembly;
mod consensus;
mod context;
mod enrichment;
mod extraction;
mod heuristics;
mod orchestrator;
mod phases;
mod prompts;
mod registry;
mod review;

pub use assembly::{Assembler, GraphBuilder};
pub use consensus::ConsensusProcessor;
pub use context::{ContextField, ContextStore, ProcessingContext, SessionGuard};
pub use enrichment::EnrichmentPhase;
pub use extraction::{extract_json, parse_json, structured_object};
pub use heuristics::{
    dedup_case_insensitive, looks_like_date, looks_like_prose, normalize_for_match,
    parse_show_date,
};
pub use orchestrator::Orchestrator;
pub use phases::{ArtistPhase, EventPhase, TypePhase, VenuePhase};
pub use registry::ProviderRegistry;
pub use review::{HIGH_RISK_FIELDS, ReviewPhase, apply_corrections};
