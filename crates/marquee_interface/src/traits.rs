//! Trait definitions for extraction providers and persistence collaborators.

use crate::ModelInfo;
use async_trait::async_trait;
use marquee_core::{ExtractionResponse, GraphEntity, GraphRelation, ImageRef};
use marquee_error::MarqueeResult;

/// Core trait all vision extraction backends must implement.
///
/// Given an image and a prompt, a provider returns raw text plus best-effort
/// structured fields and a confidence signal. Transport-level retry, backoff,
/// and rate limiting are the implementation's concern, not the pipeline's.
#[async_trait]
pub trait VisionExtractionProvider: Send + Sync {
    /// Run one extraction over the image with the given prompt.
    async fn extract_from_image(
        &self,
        image: &ImageRef,
        prompt: &str,
    ) -> MarqueeResult<ExtractionResponse>;

    /// Provider name (e.g., "ollama", "openai", "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "qwen2.5-vl-7b").
    fn model_name(&self) -> &str;

    /// Cheap availability probe; consensus skips providers that report false.
    async fn health_check(&self) -> bool {
        true
    }

    /// Metadata about this model.
    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model_name().to_string(),
            provider: self.provider_name(),
        }
    }
}

/// Entity persistence seam.
///
/// `get_entity` + `create_entities` is the existence-check-then-create pair
/// the assembler relies on for idempotent graph writes. The check-then-create
/// is not transactional; implementations that may see concurrent runs for the
/// same poster should enforce a name uniqueness constraint.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist entities. Creating an entity whose name already exists must
    /// be a no-op or an upsert, never a duplicate.
    async fn create_entities(&self, entities: &[GraphEntity]) -> MarqueeResult<()>;

    /// Look up an entity by its deterministic name.
    async fn get_entity(&self, name: &str) -> MarqueeResult<Option<GraphEntity>>;
}

/// Relation persistence seam.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Persist relations between already-created entities.
    async fn create_relations(&self, relations: &[GraphRelation]) -> MarqueeResult<()>;
}

/// Best-effort external reference catalog, used only by enrichment.
///
/// Absence of this collaborator degrades gracefully: the enrichment phase is
/// simply skipped.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Known album titles for an artist.
    async fn discography(&self, artist: &str) -> MarqueeResult<Vec<String>>;

    /// Known film titles for a person.
    async fn filmography(&self, person: &str) -> MarqueeResult<Vec<String>>;

    /// Which catalog this lookup queries (for match provenance).
    fn source_name(&self) -> &'static str;
}
