//! Pipeline orchestration.
//!
//! One [`Orchestrator`] serves arbitrarily many concurrent runs; each run
//! opens its own context session and releases it on every exit path. Phase
//! order is fixed: optional consensus, then type, artist, venue, event,
//! assembly, enrichment, review. Only the type phase can fail a run; every
//! later phase degrades to a needs-review flag.

use crate::assembly::Assembler;
use crate::consensus::ConsensusProcessor;
use crate::context::{ContextStore, ProcessingContext};
use crate::enrichment::EnrichmentPhase;
use crate::phases::{ArtistPhase, EventPhase, TypePhase, VenuePhase};
use crate::registry::ProviderRegistry;
use crate::review::{ReviewPhase, apply_corrections, touches_high_risk};
use async_trait::async_trait;
use marquee_cache::TaxonomyCache;
use marquee_core::{
    ArtistPayload, AssemblyResult, AssemblyStats, BatchResult, ConsensusResult, EventPayload,
    GraphEntity, GraphRelation, ImageRef, PhaseLog, PhaseOutcome, PhaseResult, PhaseStatus,
    PosterEntity, PosterType, ProcessingMetadata, ProcessingOptions, ProcessingResult,
    TypePayload, VenuePayload, deterministic_name,
};
use marquee_error::{ConfigError, MarqueeResult, PipelineErrorKind};
use marquee_interface::{
    EntityStore, ReferenceLookup, RelationStore, VisionExtractionProvider,
};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

/// Entry point for poster processing.
pub struct Orchestrator {
    registry: ProviderRegistry,
    entity_store: Arc<dyn EntityStore>,
    relation_store: Arc<dyn RelationStore>,
    lookup: Option<Arc<dyn ReferenceLookup>>,
    contexts: Arc<ContextStore>,
    taxonomy: tokio::sync::Mutex<TaxonomyCache>,
}

impl Orchestrator {
    /// Create an orchestrator over a provider registry and persistence seams.
    pub fn new(
        registry: ProviderRegistry,
        entity_store: Arc<dyn EntityStore>,
        relation_store: Arc<dyn RelationStore>,
    ) -> Self {
        Self {
            registry,
            entity_store,
            relation_store,
            lookup: None,
            contexts: Arc::new(ContextStore::new()),
            taxonomy: tokio::sync::Mutex::new(TaxonomyCache::default()),
        }
    }

    /// Attach a reference catalog for the enrichment phase.
    pub fn with_lookup(mut self, lookup: Arc<dyn ReferenceLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Replace the taxonomy cache (e.g. with a different TTL).
    pub fn with_taxonomy_cache(mut self, cache: TaxonomyCache) -> Self {
        self.taxonomy = tokio::sync::Mutex::new(cache);
        self
    }

    /// The session store, exposed for observability.
    pub fn contexts(&self) -> &Arc<ContextStore> {
        &self.contexts
    }

    /// Process one poster image end to end.
    ///
    /// Infrastructure problems (unreadable image, unknown model key, empty
    /// registry) and a failed type classification produce a failure result;
    /// everything else degrades to needs-review flags on a successful run.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn process_image(
        &self,
        path: impl AsRef<Path>,
        options: &ProcessingOptions,
    ) -> ProcessingResult {
        let started = Instant::now();

        if let Err(e) = validate_options(options) {
            let mut result = ProcessingResult::failure(e.to_string());
            result.elapsed = started.elapsed();
            return result;
        }

        let image = match ImageRef::from_path(path.as_ref()) {
            Ok(image) => image,
            Err(e) => {
                let kind = PipelineErrorKind::ImageNotFound(format!(
                    "{}: {e}",
                    path.as_ref().display()
                ));
                let mut result = ProcessingResult::failure(kind.to_string());
                result.elapsed = started.elapsed();
                return result;
            }
        };
        let poster_id = image.content_hash.clone();

        let provider = match self.resolve_provider(options) {
            Ok(provider) => provider,
            Err(e) => {
                let mut result = ProcessingResult::failure(e.to_string());
                result.poster_id = Some(poster_id);
                result.elapsed = started.elapsed();
                return result;
            }
        };

        let guard = self.contexts.open(image.clone());
        let session_id = guard.session_id().to_string();
        let mut ctx = guard.lock().await;

        let mut result = self
            .run_pipeline(&image, &provider, options, &mut ctx)
            .await;
        result.poster_id = Some(poster_id);
        result.session_id = Some(session_id);
        result.elapsed = started.elapsed();
        result
    }

    /// Process a batch of images sequentially with a fixed inter-image delay.
    #[tracing::instrument(skip_all, fields(count = paths.len()))]
    pub async fn process_batch(
        &self,
        paths: &[impl AsRef<Path> + Sync],
        options: &ProcessingOptions,
    ) -> BatchResult {
        let started = Instant::now();
        let mut batch = BatchResult::default();

        for (i, path) in paths.iter().enumerate() {
            if i > 0 && options.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.batch_delay_ms)).await;
            }
            let result = self.process_image(path, options).await;
            if result.success {
                batch.succeeded += 1;
                if result.phases.needs_review() {
                    batch.needs_review += 1;
                }
            } else {
                batch.failed += 1;
            }
            batch.results.push(result);
        }

        batch.elapsed = started.elapsed();
        tracing::info!(
            total = batch.results.len(),
            succeeded = batch.succeeded,
            failed = batch.failed,
            needs_review = batch.needs_review,
            "Batch finished"
        );
        batch
    }

    fn resolve_provider(
        &self,
        options: &ProcessingOptions,
    ) -> MarqueeResult<Arc<dyn VisionExtractionProvider>> {
        match &options.model_key {
            Some(key) => self.registry.get(key),
            None => self.registry.default_provider(),
        }
    }

    async fn run_pipeline(
        &self,
        image: &ImageRef,
        provider: &Arc<dyn VisionExtractionProvider>,
        options: &ProcessingOptions,
        ctx: &mut ProcessingContext,
    ) -> ProcessingResult {
        let mut phases = PhaseLog::default();

        // Optional consensus pass seeds the context before the phases run
        let consensus = match &options.consensus {
            Some(consensus_options) if consensus_options.enabled => {
                Some(
                    self.run_consensus(image, consensus_options, ctx)
                        .await,
                )
            }
            _ => None,
        };

        // Type classification is the one hard gate
        let type_result = TypePhase::new()
            .execute(image, ctx, provider.as_ref())
            .await;
        let type_failed = type_result.outcome().status == PhaseStatus::Failed;
        let type_payload = match &type_result {
            PhaseResult::Type { payload, .. } => payload.clone(),
            _ => TypePayload::default(),
        };
        let type_confidence = type_result.outcome().confidence;
        phases.type_phase = Some(type_result);

        if type_failed {
            let kind = PipelineErrorKind::TypeClassificationFailed(
                ctx.errors()
                    .last()
                    .cloned()
                    .unwrap_or_else(|| "no usable classification".to_string()),
            );
            return ProcessingResult {
                success: false,
                error: Some(kind.to_string()),
                poster_id: None,
                session_id: None,
                phases,
                entity: None,
                assembly: None,
                consensus,
                elapsed: Duration::ZERO,
            };
        }

        let artist_result = ArtistPhase::new()
            .execute(image, ctx, provider.as_ref())
            .await;
        let artist_payload = match &artist_result {
            PhaseResult::Artist { payload, .. } => payload.clone(),
            _ => ArtistPayload::default(),
        };
        let artist_confidence = artist_result.outcome().confidence;
        phases.artist = Some(artist_result);

        let venue_result = VenuePhase::new()
            .execute(image, ctx, provider.as_ref())
            .await;
        let venue_payload = match &venue_result {
            PhaseResult::Venue { payload, .. } => payload.clone(),
            _ => VenuePayload::default(),
        };
        let venue_confidence = venue_result.outcome().confidence;
        phases.venue = Some(venue_result);

        let event_result = EventPhase::new()
            .execute(image, ctx, provider.as_ref())
            .await;
        let event_payload = match &event_result {
            PhaseResult::Event { payload, .. } => payload.clone(),
            _ => EventPayload::default(),
        };
        let event_confidence = event_result.outcome().confidence;
        phases.event = Some(event_result);

        let extraction_confidence =
            (type_confidence + artist_confidence + venue_confidence + event_confidence) / 4.0;
        let mut entity = build_entity(
            image,
            provider.model_name(),
            extraction_confidence,
            &type_payload,
            &artist_payload,
            &venue_payload,
            &event_payload,
            ctx,
        );

        // Assembly
        let assembler = self.assembler(options.skip_storage);
        if !options.skip_storage {
            self.seed_taxonomy(ctx).await;
        }
        let assembly_started = Instant::now();
        let mut assembly = assembler.assemble(&entity).await;

        // Enrichment is best-effort
        let enrichment_result = EnrichmentPhase::new()
            .execute(&entity, ctx, self.lookup.as_deref())
            .await;
        if let PhaseResult::Enrichment { payload, .. } = &enrichment_result
            && !payload.matches.is_empty()
        {
            let catalog = assembler
                .assemble_catalog_matches(&entity, &payload.matches)
                .await;
            assembly.entities_created.extend(catalog.entities_created);
            assembly
                .relationships_created
                .extend(catalog.relationships_created);
            assembly.errors.extend(catalog.errors);
        }
        phases.assembly = Some(assembly_phase_result(&assembly, assembly_started.elapsed()));
        phases.enrichment = Some(enrichment_result);

        // Self-review over the assembled draft
        let review_result = ReviewPhase::new()
            .execute(
                image,
                &entity,
                ctx,
                provider.as_ref(),
                options.review_threshold,
            )
            .await;
        if let PhaseResult::Review { outcome, payload } = &review_result {
            let applied = apply_corrections(&mut entity, &payload.corrections);
            if !applied.is_empty() {
                entity.metadata.extraction_confidence =
                    entity.metadata.extraction_confidence.min(outcome.confidence);
            }
            // A corrected naming field invalidates the assembled graph
            if touches_high_risk(&applied) {
                tracing::info!(
                    fields = ?applied,
                    "Review corrected naming fields, reassembling graph"
                );
                let reassembly_started = Instant::now();
                assembly = assembler.assemble(&entity).await;
                phases.assembly =
                    Some(assembly_phase_result(&assembly, reassembly_started.elapsed()));
            }
        }
        phases.review = Some(review_result);

        ProcessingResult {
            success: true,
            error: None,
            poster_id: None,
            session_id: None,
            phases,
            entity: Some(entity),
            assembly: Some(assembly),
            consensus,
            elapsed: Duration::ZERO,
        }
    }

    async fn run_consensus(
        &self,
        image: &ImageRef,
        options: &marquee_core::ConsensusOptions,
        ctx: &mut ProcessingContext,
    ) -> ConsensusResult {
        let selection = match self.registry.select(&options.models) {
            Ok(selection) => selection,
            Err(e) => {
                ctx.record_error(format!("consensus: {e}"));
                return ConsensusResult {
                    failure: Some(e.to_string()),
                    degraded: true,
                    ..ConsensusResult::default()
                };
            }
        };
        let healthy = self.registry.healthy(selection).await;
        let processor = match ConsensusProcessor::new(options.clone()) {
            Ok(processor) => processor,
            Err(e) => {
                ctx.record_error(format!("consensus: {e}"));
                return ConsensusResult {
                    failure: Some(e.to_string()),
                    degraded: true,
                    ..ConsensusResult::default()
                };
            }
        };
        let result = processor.run(image, &healthy, ctx).await;
        if result.failed() {
            tracing::warn!(
                error = result.failure.as_deref().unwrap_or(""),
                "Consensus failed, falling back to single-provider phases"
            );
        }
        result
    }

    fn assembler(&self, skip_storage: bool) -> Assembler {
        if skip_storage {
            // Preview mode: the ledger is still produced, with every entity
            // reported as new.
            Assembler::new(Arc::new(NullEntityStore), Arc::new(NullRelationStore))
        } else {
            Assembler::new(
                Arc::clone(&self.entity_store),
                Arc::clone(&self.relation_store),
            )
        }
    }

    /// Ensure the PosterType taxonomy nodes exist, at most once per TTL.
    async fn seed_taxonomy(&self, ctx: &mut ProcessingContext) {
        let mut cache = self.taxonomy.lock().await;
        if cache.is_fresh() {
            return;
        }
        let nodes: Vec<GraphEntity> = PosterType::iter()
            .filter(|t| *t != PosterType::Unknown)
            .map(|t| GraphEntity {
                kind: marquee_core::EntityKind::PosterType,
                name: format!("postertype-{}", deterministic_name(&t.to_string())),
                display_name: t.to_string(),
                properties: serde_json::Map::new(),
            })
            .collect();
        match self.entity_store.create_entities(&nodes).await {
            Ok(()) => {
                cache.mark_seeded(PosterType::iter().filter(|t| *t != PosterType::Unknown));
                tracing::debug!(count = nodes.len(), "Seeded poster type taxonomy");
            }
            Err(e) => {
                ctx.record_error(format!("taxonomy seeding failed: {e}"));
            }
        }
    }
}

fn validate_options(options: &ProcessingOptions) -> MarqueeResult<()> {
    if !(0.0..=1.0).contains(&options.review_threshold) {
        return Err(ConfigError::new(format!(
            "review_threshold {} outside [0, 1]",
            options.review_threshold
        ))
        .into());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_entity(
    image: &ImageRef,
    model: &str,
    extraction_confidence: f32,
    type_payload: &TypePayload,
    artist_payload: &ArtistPayload,
    venue_payload: &VenuePayload,
    event_payload: &EventPayload,
    ctx: &ProcessingContext,
) -> PosterEntity {
    let mut metadata = ProcessingMetadata::new(image.content_hash.clone(), model);
    metadata.extraction_confidence = extraction_confidence.clamp(0.0, 1.0);

    let mut entity = PosterEntity::new(metadata);
    entity.title = event_payload.title.clone();
    entity.headliner = artist_payload.headliner.as_ref().map(|m| m.name.clone());
    entity.supporting_acts = artist_payload
        .supporting
        .iter()
        .map(|m| m.name.clone())
        .collect();
    entity.venue = venue_payload.name.clone();
    entity.city = venue_payload.city.clone();
    entity.state = venue_payload.state.clone();
    entity.country = venue_payload.country.clone();
    entity.dates = event_payload.dates.iter().map(|d| d.raw.clone()).collect();
    entity.ticket_price = event_payload.ticket_price.clone();
    // Consensus is the only source for these
    entity.label = ctx.field_value("label").map(str::to_string);
    entity.director = ctx.field_value("director").map(str::to_string);
    entity.set_field("cast", ctx.field_value("cast").map(str::to_string));

    if type_payload.poster_type != PosterType::Unknown {
        entity.set_primary_type(
            type_payload.poster_type,
            extraction_confidence,
            None,
            "type",
        );
    }
    for alternate in &type_payload.alternates {
        entity.add_type_inference(alternate.clone());
    }
    entity
}

fn assembly_phase_result(assembly: &AssemblyResult, elapsed: Duration) -> PhaseResult {
    let status = if assembly.errors.is_empty() {
        PhaseStatus::Completed
    } else {
        PhaseStatus::NeedsReview
    };
    PhaseResult::Assembly {
        outcome: PhaseOutcome::new(status, if assembly.errors.is_empty() { 1.0 } else { 0.5 }, elapsed),
        payload: AssemblyStats {
            entities: assembly.entities_created.len(),
            relations: assembly.relationships_created.len(),
            newly_created: assembly.newly_created(),
        },
    }
}

/// Preview-mode entity store: reports every entity as absent, accepts writes.
struct NullEntityStore;

#[async_trait]
impl EntityStore for NullEntityStore {
    async fn create_entities(&self, _entities: &[GraphEntity]) -> MarqueeResult<()> {
        Ok(())
    }

    async fn get_entity(&self, _name: &str) -> MarqueeResult<Option<GraphEntity>> {
        Ok(None)
    }
}

/// Preview-mode relation store.
struct NullRelationStore;

#[async_trait]
impl RelationStore for NullRelationStore {
    async fn create_relations(&self, _relations: &[GraphRelation]) -> MarqueeResult<()> {
        Ok(())
    }
}
