//! Taxonomy seeding cache for the Marquee pipeline.
//!
//! The assembler must guarantee that one PosterType node exists per taxonomy
//! entry before emitting HAS_TYPE relations. Seeding on every run would hammer
//! the persistence layer, so the cache remembers when the taxonomy was last
//! confirmed and answers freshness queries against an explicit TTL. The cache
//! is injected, not module-global, so tests control staleness deterministically.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;

pub use cache::{TaxonomyCache, TaxonomyCacheConfig, TaxonomyCacheConfigBuilder};
