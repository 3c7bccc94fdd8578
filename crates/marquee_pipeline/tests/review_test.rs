//! Self-review phase behavior: correction parsing, gating, application.

mod support;

use marquee_core::{
    ImageRef, PhaseResult, PhaseStatus, PosterEntity, PosterType, ProcessingMetadata,
};
use marquee_pipeline::{ContextStore, ReviewPhase, apply_corrections};
use serde_json::json;
use std::sync::Arc;
use support::ScriptedProvider;

fn image() -> ImageRef {
    ImageRef::from_bytes("poster.jpg", b"gig poster bytes")
}

fn draft() -> PosterEntity {
    let mut entity = PosterEntity::new(ProcessingMetadata::new("abc123", "scripted"));
    entity.headliner = Some("Sunday 27 January Prince of Wales".to_string());
    entity.venue = Some("Prince of Wales".to_string());
    entity.set_primary_type(PosterType::Concert, 0.8, None, "type");
    entity
}

#[tokio::test]
async fn reviewer_catches_date_text_in_the_headliner() {
    let provider = ScriptedProvider::new("reviewer").with_reply(
        "review",
        json!({
            "passed": false,
            "confidence": 0.85,
            "corrections": [{
                "field": "headliner",
                "current_value": "Sunday 27 January Prince of Wales",
                "corrected_value": "Courtney Barnett",
                "confidence": 0.9,
                "reason": "headliner field held date and venue text"
            }],
            "flagged_fields": []
        }),
    );
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;
    let mut entity = draft();

    let result = ReviewPhase::new()
        .execute(&image(), &entity, &mut ctx, &provider, 0.7)
        .await;

    let PhaseResult::Review { outcome, payload } = &result else {
        panic!("wrong variant");
    };
    assert_eq!(outcome.status, PhaseStatus::NeedsReview);
    assert!(!payload.passed);
    assert_eq!(payload.corrections.len(), 1);

    let applied = apply_corrections(&mut entity, &payload.corrections);
    assert_eq!(applied, vec!["headliner"]);
    assert_eq!(entity.headliner.as_deref(), Some("Courtney Barnett"));
}

#[tokio::test]
async fn null_corrected_value_clears_the_field() {
    let provider = ScriptedProvider::new("reviewer").with_reply(
        "review",
        json!({
            "passed": false,
            "confidence": 0.8,
            "corrections": [{
                "field": "ticket_price",
                "current_value": "SOLD OUT",
                "corrected_value": null,
                "confidence": 0.9,
                "reason": "not a price"
            }],
            "flagged_fields": []
        }),
    );
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;
    let mut entity = draft();
    entity.ticket_price = Some("SOLD OUT".to_string());

    let result = ReviewPhase::new()
        .execute(&image(), &entity, &mut ctx, &provider, 0.7)
        .await;
    let PhaseResult::Review { payload, .. } = &result else {
        panic!("wrong variant");
    };
    assert_eq!(payload.corrections[0].corrected_value, None);

    apply_corrections(&mut entity, &payload.corrections);
    assert!(entity.ticket_price.is_none());
}

#[tokio::test]
async fn low_confidence_corrections_are_not_applied() {
    let mut entity = draft();
    let corrections = vec![marquee_core::FieldCorrection {
        field: "venue".to_string(),
        current_value: Some("Prince of Wales".to_string()),
        corrected_value: Some("Somewhere Else".to_string()),
        confidence: 0.4,
        reason: None,
    }];
    let applied = apply_corrections(&mut entity, &corrections);
    assert!(applied.is_empty());
    assert_eq!(entity.venue.as_deref(), Some("Prince of Wales"));
}

#[tokio::test]
async fn clean_pass_completes_the_phase() {
    let provider = ScriptedProvider::new("reviewer").with_reply(
        "review",
        json!({
            "passed": true,
            "confidence": 0.95,
            "corrections": [],
            "flagged_fields": []
        }),
    );
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;

    let result = ReviewPhase::new()
        .execute(&image(), &draft(), &mut ctx, &provider, 0.7)
        .await;
    assert_eq!(result.outcome().status, PhaseStatus::Completed);
}

#[tokio::test]
async fn unconfident_pass_does_not_count_as_passed() {
    let provider = ScriptedProvider::new("reviewer").with_reply(
        "review",
        json!({
            "passed": true,
            "confidence": 0.4,
            "corrections": [],
            "flagged_fields": []
        }),
    );
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;

    let result = ReviewPhase::new()
        .execute(&image(), &draft(), &mut ctx, &provider, 0.7)
        .await;
    let PhaseResult::Review { outcome, payload } = &result else {
        panic!("wrong variant");
    };
    // A verdict below the threshold is demoted to not-passed
    assert!(!payload.passed);
    assert_eq!(outcome.status, PhaseStatus::NeedsReview);
}

#[tokio::test]
async fn provider_failure_flags_review_without_failing() {
    let provider = ScriptedProvider::new("reviewer").failing();
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;

    let result = ReviewPhase::new()
        .execute(&image(), &draft(), &mut ctx, &provider, 0.7)
        .await;
    assert_eq!(result.outcome().status, PhaseStatus::NeedsReview);
    assert!(!ctx.errors().is_empty());
    // Nothing usable came back, so every naming field is flagged
    let PhaseResult::Review { payload, .. } = &result else {
        panic!("wrong variant");
    };
    assert!(!payload.passed);
    assert!(payload.flagged_fields.contains(&"headliner".to_string()));
}

#[tokio::test]
async fn poster_type_correction_reclassifies_the_draft() {
    let mut entity = draft();
    let corrections = vec![marquee_core::FieldCorrection {
        field: "poster_type".to_string(),
        current_value: Some("concert".to_string()),
        corrected_value: Some("album".to_string()),
        confidence: 0.9,
        reason: Some("poster advertises a release, not a show".to_string()),
    }];
    let applied = apply_corrections(&mut entity, &corrections);
    assert_eq!(applied, vec!["poster_type"]);
    assert_eq!(entity.poster_type(), PosterType::Album);
    // The primary-type invariant held through the reclassification
    let primaries = entity
        .inferred_types
        .iter()
        .filter(|t| t.is_primary)
        .count();
    assert_eq!(primaries, 1);
}

#[tokio::test]
async fn flagged_fields_keep_the_phase_in_needs_review() {
    let provider = ScriptedProvider::new("reviewer").with_reply(
        "review",
        json!({
            "passed": true,
            "confidence": 0.9,
            "corrections": [],
            "flagged_fields": ["venue"]
        }),
    );
    let store = Arc::new(ContextStore::new());
    let guard = store.open(image());
    let mut ctx = guard.lock().await;

    let result = ReviewPhase::new()
        .execute(&image(), &draft(), &mut ctx, &provider, 0.7)
        .await;
    let PhaseResult::Review { outcome, payload } = &result else {
        panic!("wrong variant");
    };
    assert_eq!(outcome.status, PhaseStatus::NeedsReview);
    assert_eq!(payload.flagged_fields, vec!["venue"]);
}
