//! Provider registry.
//!
//! Providers are kept in registration order; that order is the deterministic
//! tie-break used by the consensus merge, so registration order is part of
//! the pipeline's observable behavior.

use marquee_error::{MarqueeResult, PipelineError, PipelineErrorKind};
use marquee_interface::VisionExtractionProvider;
use std::sync::Arc;

/// Registry of vision extraction providers keyed by model name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<(String, Arc<dyn VisionExtractionProvider>)>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a model key. Re-registering a key replaces
    /// the provider but keeps its original position.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        provider: Arc<dyn VisionExtractionProvider>,
    ) {
        let key = key.into();
        match self.providers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = provider,
            None => self.providers.push((key, provider)),
        }
    }

    /// Look up a provider by model key.
    pub fn get(&self, key: &str) -> MarqueeResult<Arc<dyn VisionExtractionProvider>> {
        self.providers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| Arc::clone(p))
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::UnknownModelKey(key.to_string())).into()
            })
    }

    /// The first registered provider, used when no model key is requested.
    pub fn default_provider(&self) -> MarqueeResult<Arc<dyn VisionExtractionProvider>> {
        self.providers
            .first()
            .map(|(_, p)| Arc::clone(p))
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::NoProviders).into())
    }

    /// Providers for a consensus fan-out, in registration order. An empty
    /// selection means "all registered providers"; unknown keys error.
    pub fn select(
        &self,
        keys: &[String],
    ) -> MarqueeResult<Vec<Arc<dyn VisionExtractionProvider>>> {
        if self.providers.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::NoProviders).into());
        }
        if keys.is_empty() {
            return Ok(self.providers.iter().map(|(_, p)| Arc::clone(p)).collect());
        }
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Filter a selection down to providers whose health probe passes.
    /// A failed probe counts as absent, not as an error.
    pub async fn healthy(
        &self,
        selection: Vec<Arc<dyn VisionExtractionProvider>>,
    ) -> Vec<Arc<dyn VisionExtractionProvider>> {
        let mut healthy = Vec::with_capacity(selection.len());
        for provider in selection {
            if provider.health_check().await {
                healthy.push(provider);
            } else {
                tracing::warn!(
                    provider = provider.model_name(),
                    "Provider failed health check, excluding from run"
                );
            }
        }
        healthy
    }

    /// Registered model keys, in registration order.
    pub fn keys(&self) -> Vec<&str> {
        self.providers.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
