//! Poster type classification phase.
//!
//! This phase is the one hard gate in the pipeline: every downstream phase
//! and the assembly dispatch depend on the poster-type taxonomy, so an
//! undeterminable type fails the whole run.

use crate::context::ProcessingContext;
use crate::extraction::{number_field, string_field, structured_object};
use crate::prompts;
use marquee_core::{
    ImageRef, PhaseOutcome, PhaseResult, PhaseStatus, PosterType, TypeInference, TypePayload,
};
use marquee_interface::VisionExtractionProvider;
use serde_json::Value;
use std::time::Instant;

/// Confidence below which a successful classification is flagged for review.
const REVIEW_THRESHOLD: f32 = 0.6;

/// Poster type classification.
#[derive(Debug, Default)]
pub struct TypePhase;

impl TypePhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Classify the poster and seed the context with the transcribed text.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        image: &ImageRef,
        ctx: &mut ProcessingContext,
        provider: &dyn VisionExtractionProvider,
    ) -> PhaseResult {
        let started = Instant::now();
        let prompt = prompts::type_prompt();

        let Some(response) =
            super::call_provider("type", image, &prompt, ctx, provider).await
        else {
            return failed(started, TypePayload::default());
        };

        let Some(map) = structured_object(&response) else {
            ctx.record_error("type: no structured data in response".to_string());
            return failed(
                started,
                TypePayload {
                    extracted_text: non_empty(&response.extracted_text),
                    ..TypePayload::default()
                },
            );
        };

        let poster_type = string_field(&map, "poster_type")
            .map(|s| PosterType::parse_lenient(&s))
            .unwrap_or(PosterType::Unknown);

        let confidence = number_field(&map, "confidence")
            .map(|c| c as f32)
            .or(response.confidence)
            .unwrap_or(0.5);

        let extracted_text =
            string_field(&map, "extracted_text").or_else(|| non_empty(&response.extracted_text));

        let alternates = parse_alternates(&map);

        // Context seeding for later phases
        if let Some(text) = &extracted_text {
            ctx.record_field("extracted_text", text.clone(), confidence, "type");
        }
        ctx.record_field("poster_type", poster_type.to_string(), confidence, "type");

        let payload = TypePayload {
            poster_type,
            alternates,
            extracted_text,
        };

        let status = if poster_type == PosterType::Unknown {
            ctx.record_error("type: classification returned unknown".to_string());
            PhaseStatus::Failed
        } else if confidence < REVIEW_THRESHOLD {
            PhaseStatus::NeedsReview
        } else {
            PhaseStatus::Completed
        };

        tracing::info!(
            poster_type = %poster_type,
            confidence,
            status = %status,
            "Type phase finished"
        );

        PhaseResult::Type {
            outcome: PhaseOutcome::new(status, confidence, started.elapsed()),
            payload,
        }
    }
}

fn failed(started: Instant, payload: TypePayload) -> PhaseResult {
    PhaseResult::Type {
        outcome: PhaseOutcome::failed(started.elapsed()),
        payload,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_alternates(map: &serde_json::Map<String, Value>) -> Vec<TypeInference> {
    let Some(Value::Array(items)) = map.get("alternates") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let Value::Object(obj) = item else {
                return None;
            };
            let type_key = string_field(obj, "type")
                .map(|s| PosterType::parse_lenient(&s))
                .filter(|t| *t != PosterType::Unknown)?;
            let confidence = number_field(obj, "confidence").unwrap_or(0.3) as f32;
            Some(TypeInference {
                type_key,
                confidence: confidence.clamp(0.0, 1.0),
                evidence: string_field(obj, "evidence"),
                source: "type".to_string(),
                is_primary: false,
            })
        })
        .collect()
}
