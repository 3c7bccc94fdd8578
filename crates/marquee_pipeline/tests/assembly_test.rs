//! Graph assembly against in-memory stores: type dispatch and idempotence.

mod support;

use marquee_core::{
    EntityKind, PosterEntity, PosterType, ProcessingMetadata, RelationKind,
};
use marquee_pipeline::Assembler;
use std::sync::Arc;
use support::{InMemoryEntityStore, InMemoryRelationStore};

fn concert_entity() -> PosterEntity {
    let mut entity = PosterEntity::new(ProcessingMetadata::new("abc123", "scripted"));
    entity.headliner = Some("The National".to_string());
    entity.supporting_acts = vec!["Big Thief".to_string()];
    entity.venue = Some("Riverside Theater".to_string());
    entity.city = Some("Milwaukee".to_string());
    entity.dates = vec!["Fri 14 June 2024".to_string()];
    entity.set_primary_type(PosterType::Concert, 0.9, None, "type");
    entity
}

fn stores() -> (Arc<InMemoryEntityStore>, Arc<InMemoryRelationStore>) {
    (
        Arc::new(InMemoryEntityStore::new()),
        Arc::new(InMemoryRelationStore::new()),
    )
}

#[tokio::test]
async fn concert_poster_builds_the_live_event_subgraph() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let result = assembler.assemble(&concert_entity()).await;

    assert!(result.errors.is_empty());
    assert!(entities.contains("poster-abc123"));
    assert!(entities.contains("event-thenational"));
    assert!(entities.contains("venue-riversidetheater"));
    assert!(entities.contains("artist-thenational"));
    assert!(entities.contains("artist-bigthief"));
    assert!(entities.contains("show-thenational-riversidetheater-20240614"));

    let rels = relations.all();
    assert!(rels.iter().any(|r| r.kind == RelationKind::Promotes));
    assert!(rels.iter().any(|r| r.kind == RelationKind::HeldAt));
    assert!(rels.iter().any(|r| r.kind == RelationKind::PartOf));
    // Headliner carries billing order 0
    let headliner_performs = rels
        .iter()
        .find(|r| r.kind == RelationKind::PerformsIn && r.from == "artist-thenational")
        .unwrap();
    assert_eq!(headliner_performs.properties["billing_order"], 0);
}

#[tokio::test]
async fn reassembly_finds_prior_entities_instead_of_duplicating() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let first = assembler.assemble(&concert_entity()).await;
    assert!(first.newly_created() > 0);
    let count_after_first = entities.len();

    let second = assembler.assemble(&concert_entity()).await;
    assert_eq!(entities.len(), count_after_first);
    assert_eq!(second.newly_created(), 0);
    assert!(second.entities_created.iter().all(|e| !e.is_new));
    // Both runs touched the same names
    let names = |r: &marquee_core::AssemblyResult| {
        r.entities_created
            .iter()
            .map(|e| e.name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
}

#[tokio::test]
async fn album_poster_builds_release_subgraph() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let mut entity = PosterEntity::new(ProcessingMetadata::new("feed42", "scripted"));
    entity.title = Some("In Rainbows".to_string());
    entity.headliner = Some("Radiohead".to_string());
    entity.label = Some("XL Recordings".to_string());
    entity.set_primary_type(PosterType::Album, 0.85, None, "type");

    let result = assembler.assemble(&entity).await;

    assert!(result.errors.is_empty());
    assert!(entities.contains("album-inrainbows"));
    assert!(entities.contains("artist-radiohead"));
    assert!(entities.contains("organization-xlrecordings"));
    let rels = relations.all();
    assert!(rels.iter().any(|r| {
        r.kind == RelationKind::CreatedBy
            && r.from == "album-inrainbows"
            && r.to == "artist-radiohead"
    }));
    assert!(rels.iter().any(|r| r.kind == RelationKind::ReleasedBy));
    // No live-event subgraph for a plain album poster
    assert!(!entities.names().iter().any(|n| n.starts_with("event-")));
    assert!(!entities.names().iter().any(|n| n.starts_with("show-")));
}

#[tokio::test]
async fn hybrid_poster_builds_both_subgraphs() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let mut entity = concert_entity();
    entity.title = Some("Laugh Track".to_string());
    entity.set_primary_type(PosterType::Hybrid, 0.8, None, "type");

    let result = assembler.assemble(&entity).await;

    assert!(result.errors.is_empty());
    assert!(entities.names().iter().any(|n| n.starts_with("event-")));
    assert!(entities.contains("album-laughtrack"));
}

#[tokio::test]
async fn film_poster_builds_film_subgraph() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let mut entity = PosterEntity::new(ProcessingMetadata::new("ff1122", "scripted"));
    entity.title = Some("Stop Making Sense".to_string());
    entity.director = Some("Jonathan Demme".to_string());
    entity.cast = vec!["David Byrne".to_string()];
    entity.set_primary_type(PosterType::Film, 0.9, None, "type");

    let result = assembler.assemble(&entity).await;

    assert!(result.errors.is_empty());
    assert!(entities.contains("film-stopmakingsense"));
    assert!(entities.contains("person-jonathandemme"));
    assert!(entities.contains("person-davidbyrne"));
    let rels = relations.all();
    assert!(rels.iter().any(|r| r.kind == RelationKind::DirectedBy));
    assert!(rels.iter().any(|r| r.kind == RelationKind::Stars));
}

#[tokio::test]
async fn multiple_dates_create_one_show_each() {
    let (entities, _relations) = stores();
    let assembler = Assembler::new(entities.clone(), Arc::new(InMemoryRelationStore::new()));

    let mut entity = concert_entity();
    entity.dates = vec![
        "Fri 14 June 2024".to_string(),
        "Sat 15 June 2024".to_string(),
    ];

    let result = assembler.assemble(&entity).await;

    assert!(result.errors.is_empty());
    assert!(entities.contains("show-thenational-riversidetheater-20240614"));
    assert!(entities.contains("show-thenational-riversidetheater-20240615"));
}

#[tokio::test]
async fn has_type_relations_carry_primary_flag_and_confidence() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let mut entity = concert_entity();
    entity.add_type_inference(marquee_core::TypeInference {
        type_key: PosterType::Album,
        confidence: 0.4,
        evidence: None,
        source: "type".to_string(),
        is_primary: false,
    });

    assembler.assemble(&entity).await;

    let rels = relations.all();
    let type_rels: Vec<_> = rels
        .iter()
        .filter(|r| r.kind == RelationKind::HasType)
        .collect();
    assert_eq!(type_rels.len(), 2);
    let primaries: Vec<_> = type_rels
        .iter()
        .filter(|r| r.properties["is_primary"] == true)
        .collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].to, "postertype-concert");
}

#[tokio::test]
async fn unnameable_entities_are_skipped_with_errors_not_aborts() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let mut entity = concert_entity();
    // Pure punctuation normalizes to the empty string
    entity.venue = Some("-- // --".to_string());

    let result = assembler.assemble(&entity).await;

    assert!(!result.errors.is_empty());
    // The rest of the graph was still built
    assert!(entities.contains("event-thenational"));
    assert!(entities.contains("artist-thenational"));
}

#[tokio::test]
async fn assembly_records_entity_kinds() {
    let (entities, relations) = stores();
    let assembler = Assembler::new(entities.clone(), relations.clone());

    let result = assembler.assemble(&concert_entity()).await;

    let kinds: Vec<EntityKind> = result.entities_created.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EntityKind::Poster));
    assert!(kinds.contains(&EntityKind::Event));
    assert!(kinds.contains(&EntityKind::Venue));
    assert!(kinds.contains(&EntityKind::Artist));
    assert!(kinds.contains(&EntityKind::Show));
    assert!(kinds.contains(&EntityKind::PosterType));
}
