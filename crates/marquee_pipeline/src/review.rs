//! Self-review phase.
//!
//! The model is shown its own draft next to the original image and asked to
//! critique it against a catalog of known error patterns. Corrections come
//! back per field; `corrected_value: null` means "clear the field", while an
//! absent key means the reviewer proposed nothing.

use crate::context::ProcessingContext;
use crate::extraction::{number_field, string_field, string_list_field, structured_object};
use crate::prompts;
use marquee_core::{
    FieldCorrection, ImageRef, PhaseOutcome, PhaseResult, PhaseStatus, PosterEntity, PosterType,
    ReviewPayload,
};
use marquee_interface::VisionExtractionProvider;
use serde_json::Value;
use std::time::Instant;

/// Corrections below this confidence are ignored.
const APPLY_THRESHOLD: f32 = 0.5;

/// Fields whose correction invalidates the assembled graph: they feed the
/// deterministic entity names, so assembly must rerun after a change.
pub const HIGH_RISK_FIELDS: [&str; 4] = ["headliner", "venue", "dates", "poster_type"];

/// Self-review over the assembled draft.
#[derive(Debug, Default)]
pub struct ReviewPhase;

impl ReviewPhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Ask the provider to critique the draft against the image.
    ///
    /// The reviewer's verdict only counts as passed when its overall
    /// confidence reaches `review_threshold`.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        image: &ImageRef,
        entity: &PosterEntity,
        ctx: &mut ProcessingContext,
        provider: &dyn VisionExtractionProvider,
        review_threshold: f32,
    ) -> PhaseResult {
        let started = Instant::now();

        let draft_json = match serde_json::to_string_pretty(entity) {
            Ok(json) => json,
            Err(e) => {
                ctx.record_error(format!("review: draft serialization failed: {e}"));
                return PhaseResult::Review {
                    outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                    payload: ReviewPayload::default(),
                };
            }
        };
        let prompt = prompts::review_prompt(&draft_json);

        let Some(response) =
            crate::phases::call_provider("review", image, &prompt, ctx, provider).await
        else {
            return PhaseResult::Review {
                outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                payload: conservative_failure(),
            };
        };

        let Some(map) = structured_object(&response) else {
            ctx.record_error("review: no structured data in response".to_string());
            return PhaseResult::Review {
                outcome: PhaseOutcome::new(PhaseStatus::NeedsReview, 0.0, started.elapsed()),
                payload: conservative_failure(),
            };
        };

        let verdict = matches!(map.get("passed"), Some(Value::Bool(true)));
        let confidence = number_field(&map, "confidence")
            .map(|c| c as f32)
            .or(response.confidence)
            .unwrap_or(0.5);
        // An unconfident pass is not a pass
        let passed = verdict && confidence >= review_threshold;
        let corrections = parse_corrections(map.get("corrections"));
        let flagged_fields = string_list_field(&map, "flagged_fields");

        let payload = ReviewPayload {
            passed,
            confidence,
            corrections,
            flagged_fields,
        };

        let status = if payload.passed
            && payload.flagged_fields.is_empty()
            && payload.corrections.is_empty()
        {
            PhaseStatus::Completed
        } else {
            PhaseStatus::NeedsReview
        };

        tracing::info!(
            passed = payload.passed,
            corrections = payload.corrections.len(),
            flagged = payload.flagged_fields.len(),
            confidence,
            "Review phase finished"
        );

        PhaseResult::Review {
            outcome: PhaseOutcome::new(status, confidence, started.elapsed()),
            payload,
        }
    }
}

/// Verdict used when the reviewer produced nothing usable: nothing passed,
/// every naming field flagged for a human.
fn conservative_failure() -> ReviewPayload {
    ReviewPayload {
        passed: false,
        confidence: 0.0,
        corrections: Vec::new(),
        flagged_fields: HIGH_RISK_FIELDS.iter().map(|f| f.to_string()).collect(),
    }
}

/// Apply reviewer corrections to the entity.
///
/// Corrections below the confidence threshold are skipped, as are field names
/// the entity does not expose. `poster_type` corrections go through
/// [`PosterEntity::set_primary_type`]; they cannot clear the type. Returns the
/// names of the fields actually changed.
pub fn apply_corrections(
    entity: &mut PosterEntity,
    corrections: &[FieldCorrection],
) -> Vec<String> {
    let mut applied = Vec::new();
    for correction in corrections {
        if correction.confidence < APPLY_THRESHOLD {
            tracing::debug!(
                field = %correction.field,
                confidence = correction.confidence,
                "Skipping low-confidence correction"
            );
            continue;
        }
        if correction.field == "poster_type" {
            let Some(raw) = &correction.corrected_value else {
                continue;
            };
            let parsed = PosterType::parse_lenient(raw);
            if parsed == PosterType::Unknown {
                continue;
            }
            entity.set_primary_type(
                parsed,
                correction.confidence,
                correction.reason.clone(),
                "review",
            );
            applied.push(correction.field.clone());
            continue;
        }
        if entity.set_field(&correction.field, correction.corrected_value.clone()) {
            tracing::info!(
                field = %correction.field,
                cleared = correction.corrected_value.is_none(),
                "Applied review correction"
            );
            applied.push(correction.field.clone());
        }
    }
    applied
}

/// Whether any applied correction touched a field that feeds entity naming.
pub(crate) fn touches_high_risk(applied: &[String]) -> bool {
    applied
        .iter()
        .any(|f| HIGH_RISK_FIELDS.contains(&f.as_str()))
}

fn parse_corrections(value: Option<&Value>) -> Vec<FieldCorrection> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let Value::Object(obj) = item else {
                return None;
            };
            let field = string_field(obj, "field")?;
            // Tri-state: an absent corrected_value key proposes nothing,
            // explicit null clears the field.
            let corrected_value = match obj.get("corrected_value")? {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            Some(FieldCorrection {
                field,
                current_value: string_field(obj, "current_value"),
                corrected_value,
                confidence: number_field(obj, "confidence").unwrap_or(0.5) as f32,
                reason: string_field(obj, "reason"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::ProcessingMetadata;

    fn entity() -> PosterEntity {
        PosterEntity::new(ProcessingMetadata::new("hash", "model"))
    }

    fn correction(field: &str, value: Option<&str>, confidence: f32) -> FieldCorrection {
        FieldCorrection {
            field: field.to_string(),
            current_value: None,
            corrected_value: value.map(str::to_string),
            confidence,
            reason: None,
        }
    }

    #[test]
    fn null_correction_clears_the_field() {
        let mut e = entity();
        e.headliner = Some("Sunday 27 January Prince of Wales".to_string());
        let applied = apply_corrections(&mut e, &[correction("headliner", None, 0.9)]);
        assert_eq!(applied, vec!["headliner"]);
        assert!(e.headliner.is_none());
    }

    #[test]
    fn low_confidence_corrections_are_skipped() {
        let mut e = entity();
        e.venue = Some("The Tivoli".to_string());
        let applied = apply_corrections(&mut e, &[correction("venue", Some("The Zoo"), 0.3)]);
        assert!(applied.is_empty());
        assert_eq!(e.venue.as_deref(), Some("The Tivoli"));
    }

    #[test]
    fn poster_type_correction_reclassifies() {
        let mut e = entity();
        e.set_primary_type(PosterType::Concert, 0.6, None, "type");
        let applied =
            apply_corrections(&mut e, &[correction("poster_type", Some("album"), 0.8)]);
        assert_eq!(applied, vec!["poster_type"]);
        assert_eq!(e.poster_type(), PosterType::Album);
    }

    #[test]
    fn unknown_field_names_are_ignored() {
        let mut e = entity();
        let applied = apply_corrections(&mut e, &[correction("barcode", Some("x"), 0.9)]);
        assert!(applied.is_empty());
    }

    #[test]
    fn absent_corrected_value_key_proposes_nothing() {
        let parsed = parse_corrections(Some(&serde_json::json!([
            {"field": "venue", "confidence": 0.9},
            {"field": "headliner", "corrected_value": null, "confidence": 0.9},
            {"field": "city", "corrected_value": "Brisbane", "confidence": 0.8}
        ])));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].field, "headliner");
        assert_eq!(parsed[0].corrected_value, None);
        assert_eq!(parsed[1].corrected_value.as_deref(), Some("Brisbane"));
    }

    #[test]
    fn naming_fields_are_high_risk() {
        assert!(touches_high_risk(&["venue".to_string()]));
        assert!(!touches_high_risk(&["ticket_price".to_string()]));
    }
}
