//! Event and date extraction phase.

use crate::context::ProcessingContext;
use crate::extraction::{number_field, string_field, string_list_field, structured_object};
use crate::heuristics::parse_show_date;
use crate::prompts;
use marquee_core::{EventPayload, ImageRef, PhaseOutcome, PhaseResult, PhaseStatus, ShowDate};
use marquee_interface::VisionExtractionProvider;
use std::time::Instant;

const REVIEW_THRESHOLD: f32 = 0.5;

/// Event detail extraction: show dates, title, ticket price.
#[derive(Debug, Default)]
pub struct EventPhase;

impl EventPhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Extract show dates and ancillary event details.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        image: &ImageRef,
        ctx: &mut ProcessingContext,
        provider: &dyn VisionExtractionProvider,
    ) -> PhaseResult {
        let started = Instant::now();
        let extracted_text = ctx.field_value("extracted_text").map(str::to_string);
        let prompt = prompts::event_prompt(extracted_text.as_deref());

        let Some(response) =
            super::call_provider("event", image, &prompt, ctx, provider).await
        else {
            return PhaseResult::Event {
                outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                payload: EventPayload::default(),
            };
        };

        let map = structured_object(&response);

        let ancillary_confidence = map
            .as_ref()
            .and_then(|m| number_field(m, "confidence"))
            .map(|c| c as f32)
            .or(response.confidence)
            .unwrap_or(0.5);

        let raw_dates = map
            .as_ref()
            .map(|m| string_list_field(m, "dates"))
            .unwrap_or_default();
        let dates: Vec<ShowDate> = raw_dates
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_show_date(raw))
            .collect();

        let title = map.as_ref().and_then(|m| string_field(m, "title"));
        let ticket_price = map.as_ref().and_then(|m| string_field(m, "ticket_price"));

        // Dates dominate the phase confidence; title and price are ancillary.
        let confidence = if dates.is_empty() {
            ancillary_confidence * 0.5
        } else {
            let mean_date =
                dates.iter().map(|d| d.confidence).sum::<f32>() / dates.len() as f32;
            (2.0 * mean_date + ancillary_confidence) / 3.0
        };

        let any_unparsed = dates
            .iter()
            .any(|d| d.year.is_none() || d.month.is_none() || d.day.is_none());
        let needs_review = dates.is_empty() || any_unparsed;

        if !dates.is_empty() {
            let joined = dates
                .iter()
                .map(|d| d.raw.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            ctx.record_field("dates", joined, confidence, "event");
        }
        if let Some(title) = &title {
            ctx.record_field("title", title.clone(), ancillary_confidence, "event");
        }
        if let Some(price) = &ticket_price {
            ctx.record_field("ticket_price", price.clone(), ancillary_confidence, "event");
        }

        let status = if needs_review || confidence < REVIEW_THRESHOLD {
            PhaseStatus::NeedsReview
        } else {
            PhaseStatus::Completed
        };

        tracing::info!(
            dates = dates.len(),
            title = title.as_deref().unwrap_or(""),
            confidence,
            status = %status,
            "Event phase finished"
        );

        PhaseResult::Event {
            outcome: PhaseOutcome::new(status, confidence, started.elapsed()),
            payload: EventPayload {
                title,
                dates,
                ticket_price,
            },
        }
    }
}
