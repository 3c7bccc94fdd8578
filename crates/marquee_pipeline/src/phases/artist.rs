//! Artist extraction phase.

use crate::context::ProcessingContext;
use crate::extraction::{number_field, string_field, string_list_field, structured_object};
use crate::heuristics::{dedup_case_insensitive, looks_like_date};
use crate::prompts;
use marquee_core::{
    ArtistMatch, ArtistPayload, ImageRef, PhaseOutcome, PhaseResult, PhaseStatus, PosterType,
};
use marquee_interface::VisionExtractionProvider;
use std::time::Instant;

const REVIEW_THRESHOLD: f32 = 0.5;

/// Artist extraction.
#[derive(Debug, Default)]
pub struct ArtistPhase;

impl ArtistPhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Extract headliner and supporting acts, reusing the type phase's
    /// transcription to avoid re-OCR.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        image: &ImageRef,
        ctx: &mut ProcessingContext,
        provider: &dyn VisionExtractionProvider,
    ) -> PhaseResult {
        let started = Instant::now();
        let extracted_text = ctx.field_value("extracted_text").map(str::to_string);
        let prompt = prompts::artist_prompt(extracted_text.as_deref());

        let Some(response) =
            super::call_provider("artist", image, &prompt, ctx, provider).await
        else {
            // Provider failure never hard-fails the run; it only elevates review
            return PhaseResult::Artist {
                outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                payload: ArtistPayload::default(),
            };
        };

        let map = structured_object(&response);

        let base_confidence = map
            .as_ref()
            .and_then(|m| number_field(m, "confidence"))
            .map(|c| c as f32)
            .or(response.confidence)
            .unwrap_or(0.5);

        let headliner_name = map
            .as_ref()
            .and_then(|m| string_field(m, "headliner"))
            // Consensus may have seeded the field when the phase parse misses
            .or_else(|| ctx.field_value("headliner").map(str::to_string));

        let supporting_names = dedup_case_insensitive(
            map.as_ref()
                .map(|m| string_list_field(m, "supporting_acts"))
                .unwrap_or_default(),
        );

        let mut needs_review = false;

        // Disambiguation: date or venue text misfiled as the artist name is
        // the single most common model error on gig posters.
        if let Some(name) = &headliner_name
            && looks_like_date(name)
        {
            tracing::debug!(headliner = %name, "Headliner looks like date text");
            needs_review = true;
        }

        // Film posters credit actors, not musicians; billing fields there
        // routinely hold cast names.
        if ctx.field_value("poster_type") == Some(&PosterType::Film.to_string())
            && headliner_name.is_some()
        {
            needs_review = true;
        }

        if headliner_name.is_none() {
            needs_review = true;
        }

        let headliner = headliner_name.clone().map(|name| ArtistMatch {
            name,
            registry_id: None,
            confidence: base_confidence,
        });
        let supporting: Vec<ArtistMatch> = supporting_names
            .iter()
            .map(|name| ArtistMatch {
                name: name.clone(),
                registry_id: None,
                confidence: base_confidence,
            })
            .collect();

        // Conservative aggregation: the phase is only as confident as its
        // weakest sub-field.
        let confidence = headliner
            .iter()
            .chain(supporting.iter())
            .map(|m| m.confidence)
            .fold(base_confidence, f32::min);

        if let Some(name) = &headliner_name {
            ctx.record_field("headliner", name.clone(), confidence, "artist");
        }
        if !supporting_names.is_empty() {
            ctx.record_field(
                "supporting_acts",
                supporting_names.join("; "),
                confidence,
                "artist",
            );
        }

        let status = if needs_review || confidence < REVIEW_THRESHOLD {
            PhaseStatus::NeedsReview
        } else {
            PhaseStatus::Completed
        };

        tracing::info!(
            headliner = headliner_name.as_deref().unwrap_or("<none>"),
            supporting = supporting.len(),
            confidence,
            status = %status,
            "Artist phase finished"
        );

        PhaseResult::Artist {
            outcome: PhaseOutcome::new(status, confidence, started.elapsed()),
            payload: ArtistPayload {
                headliner,
                supporting,
            },
        }
    }
}
