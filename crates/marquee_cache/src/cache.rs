//! Taxonomy cache implementation.

use derive_getters::Getters;
use marquee_core::PosterType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Configuration for the taxonomy cache.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, derive_builder::Builder)]
pub struct TaxonomyCacheConfig {
    /// How long a confirmed seeding stays fresh (seconds)
    #[serde(default = "default_ttl")]
    #[builder(default = "default_ttl()")]
    ttl_secs: u64,

    /// Whether caching is enabled; disabled means every query reports stale
    #[serde(default = "default_enabled")]
    #[builder(default = "true")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    3600
}

fn default_enabled() -> bool {
    true
}

impl Default for TaxonomyCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            enabled: default_enabled(),
        }
    }
}

/// Cache tracking which PosterType taxonomy nodes have been confirmed in the
/// graph, with TTL-based staleness.
///
/// # Example
///
/// ```
/// use marquee_cache::{TaxonomyCache, TaxonomyCacheConfig};
/// use marquee_core::PosterType;
/// use strum::IntoEnumIterator;
///
/// let mut cache = TaxonomyCache::new(TaxonomyCacheConfig::default());
/// assert!(!cache.is_fresh());
///
/// cache.mark_seeded(PosterType::iter());
/// assert!(cache.is_fresh());
/// assert!(cache.contains(PosterType::Concert));
///
/// cache.force_refresh();
/// assert!(!cache.is_fresh());
/// ```
pub struct TaxonomyCache {
    config: TaxonomyCacheConfig,
    seeded: BTreeSet<PosterType>,
    seeded_at: Option<Instant>,
}

impl TaxonomyCache {
    /// Create a new cache with configuration.
    pub fn new(config: TaxonomyCacheConfig) -> Self {
        tracing::debug!(
            ttl_secs = config.ttl_secs,
            enabled = config.enabled,
            "Creating new TaxonomyCache"
        );
        Self {
            config,
            seeded: BTreeSet::new(),
            seeded_at: None,
        }
    }

    /// Whether the last confirmed seeding is still within its TTL.
    pub fn is_fresh(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self.seeded_at {
            Some(at) => at.elapsed() <= Duration::from_secs(self.config.ttl_secs),
            None => false,
        }
    }

    /// Whether a specific type was part of the last confirmed seeding.
    pub fn contains(&self, poster_type: PosterType) -> bool {
        self.is_fresh() && self.seeded.contains(&poster_type)
    }

    /// Record a completed seeding pass.
    pub fn mark_seeded(&mut self, types: impl IntoIterator<Item = PosterType>) {
        self.seeded = types.into_iter().collect();
        self.seeded_at = Some(Instant::now());
        tracing::debug!(count = self.seeded.len(), "Taxonomy seeding confirmed");
    }

    /// Drop the confirmation, forcing the next assembly to re-seed.
    pub fn force_refresh(&mut self) {
        self.seeded.clear();
        self.seeded_at = None;
        tracing::debug!("Taxonomy cache invalidated");
    }

    /// The types confirmed by the last seeding, empty when stale.
    pub fn seeded_types(&self) -> Vec<PosterType> {
        if self.is_fresh() {
            self.seeded.iter().copied().collect()
        } else {
            Vec::new()
        }
    }
}

impl Default for TaxonomyCache {
    fn default() -> Self {
        Self::new(TaxonomyCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn starts_stale() {
        let cache = TaxonomyCache::default();
        assert!(!cache.is_fresh());
        assert!(cache.seeded_types().is_empty());
    }

    #[test]
    fn seeding_makes_fresh() {
        let mut cache = TaxonomyCache::default();
        cache.mark_seeded(PosterType::iter());
        assert!(cache.is_fresh());
        assert_eq!(cache.seeded_types().len(), 10);
    }

    #[test]
    fn zero_ttl_expires_immediately_on_elapsed_time() {
        let config = TaxonomyCacheConfigBuilder::default()
            .ttl_secs(0u64)
            .build()
            .unwrap();
        let mut cache = TaxonomyCache::new(config);
        cache.mark_seeded([PosterType::Concert]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(!cache.is_fresh());
    }

    #[test]
    fn disabled_cache_always_stale() {
        let config = TaxonomyCacheConfigBuilder::default()
            .enabled(false)
            .build()
            .unwrap();
        let mut cache = TaxonomyCache::new(config);
        cache.mark_seeded(PosterType::iter());
        assert!(!cache.is_fresh());
        assert!(!cache.contains(PosterType::Concert));
    }

    #[test]
    fn force_refresh_invalidates() {
        let mut cache = TaxonomyCache::default();
        cache.mark_seeded(PosterType::iter());
        cache.force_refresh();
        assert!(!cache.is_fresh());
    }
}
