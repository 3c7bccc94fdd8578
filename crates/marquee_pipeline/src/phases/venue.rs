//! Venue extraction phase.

use crate::context::ProcessingContext;
use crate::extraction::{number_field, string_field, structured_object};
use crate::heuristics::looks_like_prose;
use crate::prompts;
use marquee_core::{ImageRef, PhaseOutcome, PhaseResult, PhaseStatus, VenuePayload};
use marquee_interface::VisionExtractionProvider;
use std::time::Instant;

const REVIEW_THRESHOLD: f32 = 0.5;

/// Venue and location extraction.
#[derive(Debug, Default)]
pub struct VenuePhase;

impl VenuePhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Extract the venue name and location.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        image: &ImageRef,
        ctx: &mut ProcessingContext,
        provider: &dyn VisionExtractionProvider,
    ) -> PhaseResult {
        let started = Instant::now();
        let extracted_text = ctx.field_value("extracted_text").map(str::to_string);
        let prompt = prompts::venue_prompt(extracted_text.as_deref());

        let Some(response) =
            super::call_provider("venue", image, &prompt, ctx, provider).await
        else {
            return PhaseResult::Venue {
                outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                payload: VenuePayload::default(),
            };
        };

        let map = structured_object(&response);

        let confidence = map
            .as_ref()
            .and_then(|m| number_field(m, "confidence"))
            .map(|c| c as f32)
            .or(response.confidence)
            .unwrap_or(0.5);

        let name = map
            .as_ref()
            .and_then(|m| string_field(m, "venue"))
            .or_else(|| ctx.field_value("venue").map(str::to_string));
        let city = map.as_ref().and_then(|m| string_field(m, "city"));
        let state = map.as_ref().and_then(|m| string_field(m, "state"));
        let country = map.as_ref().and_then(|m| string_field(m, "country"));

        let mut needs_review = name.is_none();

        // A sentence describing the venue is a known failure mode; real venue
        // names don't narrate.
        if let Some(venue_name) = &name
            && looks_like_prose(venue_name)
        {
            tracing::debug!(venue = %venue_name, "Venue name reads like prose");
            needs_review = true;
        }

        if let Some(venue_name) = &name {
            ctx.record_field("venue", venue_name.clone(), confidence, "venue");
        }
        if let Some(city) = &city {
            ctx.record_field("city", city.clone(), confidence, "venue");
        }
        if let Some(state) = &state {
            ctx.record_field("state", state.clone(), confidence, "venue");
        }
        if let Some(country) = &country {
            ctx.record_field("country", country.clone(), confidence, "venue");
        }

        let status = if needs_review || confidence < REVIEW_THRESHOLD {
            PhaseStatus::NeedsReview
        } else {
            PhaseStatus::Completed
        };

        tracing::info!(
            venue = name.as_deref().unwrap_or("<none>"),
            city = city.as_deref().unwrap_or(""),
            confidence,
            status = %status,
            "Venue phase finished"
        );

        PhaseResult::Venue {
            outcome: PhaseOutcome::new(status, confidence, started.elapsed()),
            payload: VenuePayload {
                name,
                city,
                state,
                country,
            },
        }
    }
}
