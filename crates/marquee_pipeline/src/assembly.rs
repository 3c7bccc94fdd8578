//! Type-dispatched graph assembly.
//!
//! Assembly turns the merged poster record into graph entities and relations
//! through the persistence seams. Writes are idempotent by construction:
//! every entity name is a pure function of normalized text, and the builder
//! checks existence before creating. Sub-step failures are collected on the
//! result and never abort the rest of the graph.

use crate::heuristics::parse_show_date;
use marquee_core::{
    AssemblyResult, CatalogKind, CatalogMatch, EntityKind, EntityRecord, GraphEntity,
    GraphRelation, PosterEntity, PosterType, RelationKind, RelationRecord, deterministic_name,
    show_name,
};
use marquee_error::{AssemblyError, AssemblyErrorKind, MarqueeResult};
use marquee_interface::{EntityStore, RelationStore};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Ledger-keeping wrapper over the persistence seams.
///
/// Every write goes through the existence-check-then-create pair, so reruns
/// against the same store find prior entities instead of duplicating them.
/// The check-then-create is not transactional; concurrent runs for the same
/// poster rely on the store's name uniqueness.
pub struct GraphBuilder {
    entities: Arc<dyn EntityStore>,
    relations: Arc<dyn RelationStore>,
    entity_ledger: Vec<EntityRecord>,
    relation_ledger: Vec<RelationRecord>,
}

impl GraphBuilder {
    /// Create a builder over the given stores.
    pub fn new(entities: Arc<dyn EntityStore>, relations: Arc<dyn RelationStore>) -> Self {
        Self {
            entities,
            relations,
            entity_ledger: Vec::new(),
            relation_ledger: Vec::new(),
        }
    }

    /// Ensure an entity exists, creating it only when absent, and return its
    /// deterministic name.
    pub async fn ensure_entity(
        &mut self,
        kind: EntityKind,
        display_name: &str,
        properties: Map<String, Value>,
    ) -> MarqueeResult<String> {
        let slug = deterministic_name(display_name);
        if slug.is_empty() {
            return Err(AssemblyError::new(AssemblyErrorKind::EmptyEntity(format!(
                "{kind} name empty after normalization"
            )))
            .into());
        }
        let name = format!("{}-{}", kind.to_string().to_lowercase(), slug);
        self.ensure_named(kind, name, display_name, properties).await
    }

    /// Ensure an entity with a caller-supplied deterministic name.
    ///
    /// Shows and posters derive their names from more than one attribute, so
    /// they cannot go through [`GraphBuilder::ensure_entity`].
    pub async fn ensure_named(
        &mut self,
        kind: EntityKind,
        name: String,
        display_name: &str,
        properties: Map<String, Value>,
    ) -> MarqueeResult<String> {
        let existing = self.entities.get_entity(&name).await.map_err(|e| {
            AssemblyError::new(AssemblyErrorKind::LookupFailed(name.clone(), e.to_string()))
        })?;

        let is_new = existing.is_none();
        if is_new {
            let entity = GraphEntity {
                kind,
                name: name.clone(),
                display_name: display_name.to_string(),
                properties,
            };
            self.entities
                .create_entities(std::slice::from_ref(&entity))
                .await
                .map_err(|e| {
                    AssemblyError::new(AssemblyErrorKind::EntityCreateFailed {
                        kind: kind.to_string(),
                        name: name.clone(),
                        message: e.to_string(),
                    })
                })?;
            tracing::debug!(kind = %kind, name = %name, "Created entity");
        } else {
            tracing::debug!(kind = %kind, name = %name, "Entity already exists");
        }
        self.entity_ledger.push(EntityRecord {
            kind,
            name: name.clone(),
            is_new,
        });
        Ok(name)
    }

    /// Record a relation between two already-ensured entities.
    pub async fn relate(
        &mut self,
        kind: RelationKind,
        from: &str,
        to: &str,
        properties: Map<String, Value>,
    ) -> MarqueeResult<()> {
        let relation = GraphRelation {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            properties,
        };
        self.relations
            .create_relations(std::slice::from_ref(&relation))
            .await
            .map_err(|e| {
                AssemblyError::new(AssemblyErrorKind::RelationCreateFailed {
                    kind: kind.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                    message: e.to_string(),
                })
            })?;
        self.relation_ledger.push(RelationRecord {
            kind,
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    fn finish(self) -> (Vec<EntityRecord>, Vec<RelationRecord>) {
        (self.entity_ledger, self.relation_ledger)
    }
}

/// Type-dispatched assembler.
///
/// Concert-family posters get the full event/venue/show/artist subgraph;
/// album posters get album/artist/label; film posters get film/director/cast;
/// hybrids get both the release and the live-event subgraphs; promo and
/// exhibition posters carry only the poster and its type taxonomy.
pub struct Assembler {
    entities: Arc<dyn EntityStore>,
    relations: Arc<dyn RelationStore>,
}

impl Assembler {
    /// Create an assembler over the given stores.
    pub fn new(entities: Arc<dyn EntityStore>, relations: Arc<dyn RelationStore>) -> Self {
        Self {
            entities,
            relations,
        }
    }

    /// Assemble the graph for a merged poster record.
    ///
    /// Never fails as a whole; sub-step errors are collected on the result
    /// and the rest of the graph is still built.
    #[tracing::instrument(skip_all, fields(poster_type = %entity.poster_type()))]
    pub async fn assemble(&self, entity: &PosterEntity) -> AssemblyResult {
        let mut builder = GraphBuilder::new(Arc::clone(&self.entities), Arc::clone(&self.relations));
        let mut errors = Vec::new();

        let poster_name = match self.ensure_poster(&mut builder, entity).await {
            Ok(name) => Some(name),
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        if let Some(poster_name) = &poster_name {
            self.attach_types(&mut builder, entity, poster_name, &mut errors)
                .await;

            let poster_type = entity.poster_type();
            if poster_type.is_concert_family() || poster_type == PosterType::Hybrid {
                self.assemble_live_event(&mut builder, entity, poster_name, &mut errors)
                    .await;
            }
            if matches!(poster_type, PosterType::Album | PosterType::Hybrid) {
                self.assemble_release(&mut builder, entity, &mut errors).await;
            }
            if poster_type == PosterType::Film {
                self.assemble_film(&mut builder, entity, &mut errors).await;
            }
        }

        let (entities_created, relationships_created) = builder.finish();
        tracing::info!(
            entities = entities_created.len(),
            relations = relationships_created.len(),
            new = entities_created.iter().filter(|e| e.is_new).count(),
            errors = errors.len(),
            "Assembly finished"
        );
        AssemblyResult {
            entity: entity.clone(),
            entities_created,
            relationships_created,
            errors,
        }
    }

    /// Persist enrichment catalog matches as a small graph extension.
    pub async fn assemble_catalog_matches(
        &self,
        entity: &PosterEntity,
        matches: &[CatalogMatch],
    ) -> AssemblyResult {
        let mut builder = GraphBuilder::new(Arc::clone(&self.entities), Arc::clone(&self.relations));
        let mut errors = Vec::new();

        for catalog_match in matches {
            let (entry_kind, person_kind, relation) = match catalog_match.kind {
                CatalogKind::Album => (EntityKind::Album, EntityKind::Artist, RelationKind::CreatedBy),
                CatalogKind::Film => (EntityKind::Film, EntityKind::Person, RelationKind::Stars),
            };
            let mut props = Map::new();
            props.insert("source".to_string(), json!(catalog_match.source));
            let entry = builder
                .ensure_entity(entry_kind, &catalog_match.title, props)
                .await;
            let person = builder
                .ensure_entity(person_kind, &catalog_match.artist, Map::new())
                .await;
            match (entry, person) {
                (Ok(entry), Ok(person)) => {
                    if let Err(e) = builder.relate(relation, &entry, &person, Map::new()).await {
                        errors.push(e.to_string());
                    }
                }
                (entry, person) => {
                    for result in [entry, person] {
                        if let Err(e) = result {
                            errors.push(e.to_string());
                        }
                    }
                }
            }
        }

        let (entities_created, relationships_created) = builder.finish();
        AssemblyResult {
            entity: entity.clone(),
            entities_created,
            relationships_created,
            errors,
        }
    }

    async fn ensure_poster(
        &self,
        builder: &mut GraphBuilder,
        entity: &PosterEntity,
    ) -> MarqueeResult<String> {
        // The content hash is the poster identity: the same image always
        // maps to the same poster node.
        let name = format!("poster-{}", entity.metadata.source_hash);
        let display = entity
            .title
            .as_deref()
            .or(entity.headliner.as_deref())
            .unwrap_or(&entity.metadata.source_hash)
            .to_string();

        let mut props = Map::new();
        props.insert(
            "source_hash".to_string(),
            json!(entity.metadata.source_hash),
        );
        props.insert("model".to_string(), json!(entity.metadata.model));
        props.insert(
            "extraction_confidence".to_string(),
            json!(entity.metadata.extraction_confidence),
        );
        if let Some(title) = &entity.title {
            props.insert("title".to_string(), json!(title));
        }
        if let Some(price) = &entity.ticket_price {
            props.insert("ticket_price".to_string(), json!(price));
        }
        if !entity.dates.is_empty() {
            props.insert("dates".to_string(), json!(entity.dates));
        }

        builder
            .ensure_named(EntityKind::Poster, name, &display, props)
            .await
    }

    async fn attach_types(
        &self,
        builder: &mut GraphBuilder,
        entity: &PosterEntity,
        poster_name: &str,
        errors: &mut Vec<String>,
    ) {
        for inference in &entity.inferred_types {
            let type_text = inference.type_key.to_string();
            let type_name = match builder
                .ensure_entity(EntityKind::PosterType, &type_text, Map::new())
                .await
            {
                Ok(name) => name,
                Err(e) => {
                    errors.push(e.to_string());
                    continue;
                }
            };
            let mut props = Map::new();
            props.insert("confidence".to_string(), json!(inference.confidence));
            props.insert("is_primary".to_string(), json!(inference.is_primary));
            props.insert("source".to_string(), json!(inference.source));
            if let Err(e) = builder
                .relate(RelationKind::HasType, poster_name, &type_name, props)
                .await
            {
                errors.push(e.to_string());
            }
        }
    }

    async fn assemble_live_event(
        &self,
        builder: &mut GraphBuilder,
        entity: &PosterEntity,
        poster_name: &str,
        errors: &mut Vec<String>,
    ) {
        let Some(event_display) = entity
            .title
            .as_deref()
            .or(entity.headliner.as_deref())
        else {
            errors.push("live event without title or headliner".to_string());
            return;
        };

        let mut event_props = Map::new();
        if !entity.dates.is_empty() {
            event_props.insert("dates".to_string(), json!(entity.dates));
        }
        let event_name = match builder
            .ensure_entity(EntityKind::Event, event_display, event_props)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                errors.push(e.to_string());
                return;
            }
        };

        if let Err(e) = builder
            .relate(RelationKind::Promotes, poster_name, &event_name, Map::new())
            .await
        {
            errors.push(e.to_string());
        }

        let venue_display = entity.venue.as_deref();
        if let Some(venue_display) = venue_display {
            let mut venue_props = Map::new();
            if let Some(city) = &entity.city {
                venue_props.insert("city".to_string(), json!(city));
            }
            if let Some(state) = &entity.state {
                venue_props.insert("state".to_string(), json!(state));
            }
            if let Some(country) = &entity.country {
                venue_props.insert("country".to_string(), json!(country));
            }
            match builder
                .ensure_entity(EntityKind::Venue, venue_display, venue_props)
                .await
            {
                Ok(venue_name) => {
                    if let Err(e) = builder
                        .relate(RelationKind::HeldAt, &event_name, &venue_name, Map::new())
                        .await
                    {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        // Billing order 0 is the headliner
        let mut performers: Vec<(&str, usize)> = Vec::new();
        if let Some(headliner) = entity.headliner.as_deref() {
            performers.push((headliner, 0));
        }
        for (i, act) in entity.supporting_acts.iter().enumerate() {
            performers.push((act.as_str(), i + 1));
        }

        let mut artist_names = Vec::new();
        for (performer, order) in &performers {
            match builder
                .ensure_entity(EntityKind::Artist, performer, Map::new())
                .await
            {
                Ok(name) => artist_names.push((name, *order)),
                Err(e) => errors.push(e.to_string()),
            }
        }

        // One show per date; the same artist at the same venue on another
        // night is a different show.
        let headliner_display = entity.headliner.as_deref().unwrap_or(event_display);
        let venue_for_show = venue_display.unwrap_or("unknown");
        for raw_date in &entity.dates {
            let date = parse_show_date(raw_date);
            let name = show_name(headliner_display, venue_for_show, &date.slug());
            if name.is_empty() {
                continue;
            }
            let mut props = Map::new();
            props.insert("date".to_string(), json!(date.raw));
            if let (Some(y), Some(m), Some(d)) = (date.year, date.month, date.day) {
                props.insert(
                    "iso_date".to_string(),
                    json!(format!("{y:04}-{m:02}-{d:02}")),
                );
            }
            let show = match builder
                .ensure_named(EntityKind::Show, name, raw_date, props)
                .await
            {
                Ok(name) => name,
                Err(e) => {
                    errors.push(e.to_string());
                    continue;
                }
            };
            if let Err(e) = builder
                .relate(RelationKind::PartOf, &show, &event_name, Map::new())
                .await
            {
                errors.push(e.to_string());
            }
            for (artist_name, order) in &artist_names {
                let mut props = Map::new();
                props.insert("billing_order".to_string(), json!(order));
                if let Err(e) = builder
                    .relate(RelationKind::PerformsIn, artist_name, &show, props)
                    .await
                {
                    errors.push(e.to_string());
                }
            }
        }
    }

    async fn assemble_release(
        &self,
        builder: &mut GraphBuilder,
        entity: &PosterEntity,
        errors: &mut Vec<String>,
    ) {
        let Some(album_display) = entity
            .title
            .as_deref()
            .or(entity.headliner.as_deref())
        else {
            errors.push("album poster without title or headliner".to_string());
            return;
        };

        let album_name = match builder
            .ensure_entity(EntityKind::Album, album_display, Map::new())
            .await
        {
            Ok(name) => name,
            Err(e) => {
                errors.push(e.to_string());
                return;
            }
        };

        if let Some(artist_display) = entity.headliner.as_deref() {
            match builder
                .ensure_entity(EntityKind::Artist, artist_display, Map::new())
                .await
            {
                Ok(artist_name) => {
                    if let Err(e) = builder
                        .relate(RelationKind::CreatedBy, &album_name, &artist_name, Map::new())
                        .await
                    {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        if let Some(label_display) = entity.label.as_deref() {
            match builder
                .ensure_entity(EntityKind::Organization, label_display, Map::new())
                .await
            {
                Ok(label_name) => {
                    if let Err(e) = builder
                        .relate(RelationKind::ReleasedBy, &album_name, &label_name, Map::new())
                        .await
                    {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
    }

    async fn assemble_film(
        &self,
        builder: &mut GraphBuilder,
        entity: &PosterEntity,
        errors: &mut Vec<String>,
    ) {
        let Some(film_display) = entity.title.as_deref() else {
            errors.push("film poster without title".to_string());
            return;
        };

        let film_name = match builder
            .ensure_entity(EntityKind::Film, film_display, Map::new())
            .await
        {
            Ok(name) => name,
            Err(e) => {
                errors.push(e.to_string());
                return;
            }
        };

        if let Some(director_display) = entity.director.as_deref() {
            match builder
                .ensure_entity(EntityKind::Person, director_display, Map::new())
                .await
            {
                Ok(person) => {
                    if let Err(e) = builder
                        .relate(RelationKind::DirectedBy, &film_name, &person, Map::new())
                        .await
                    {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        for cast_member in &entity.cast {
            match builder
                .ensure_entity(EntityKind::Person, cast_member, Map::new())
                .await
            {
                Ok(person) => {
                    if let Err(e) = builder
                        .relate(RelationKind::Stars, &film_name, &person, Map::new())
                        .await
                    {
                        errors.push(e.to_string());
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
    }
}
