//! Trait definitions for the Marquee extraction pipeline.
//!
//! The pipeline core only ever talks to collaborators through the seams in
//! this crate: vision extraction providers, entity/relation persistence, and
//! best-effort reference catalogs. Each seam has multiple interchangeable
//! implementations; none of them live here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{EntityStore, ReferenceLookup, RelationStore, VisionExtractionProvider};
pub use types::ModelInfo;
