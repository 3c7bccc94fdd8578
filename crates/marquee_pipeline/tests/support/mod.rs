//! Shared test doubles for the pipeline integration tests.
//!
//! Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use marquee_core::{ExtractionResponse, GraphEntity, GraphRelation, ImageRef};
use marquee_error::{MarqueeResult, ProviderError};
use marquee_interface::{
    EntityStore, ReferenceLookup, RelationStore, VisionExtractionProvider,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider that routes each phase prompt to a canned JSON reply.
///
/// Routing keys off prompt markers, so the same provider can serve a whole
/// run regardless of how many phases fire.
pub struct ScriptedProvider {
    name: String,
    replies: HashMap<&'static str, Value>,
    healthy: bool,
    fail: bool,
    calls: AtomicUsize,
}

const PROMPT_MARKERS: [(&str, &str); 6] = [
    ("type", "Classify it as exactly one of"),
    ("artist", "Extract the performers"),
    ("venue", "Extract the venue and location"),
    ("event", "Extract the event details"),
    ("review", "Review it against the image"),
    ("consensus", "Extract structured information"),
];

impl ScriptedProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: HashMap::new(),
            healthy: true,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Script the reply for one phase ("type", "artist", "venue", "event",
    /// "review", or "consensus").
    pub fn with_reply(mut self, phase: &'static str, reply: Value) -> Self {
        self.replies.insert(phase, reply);
        self
    }

    /// Make the health probe fail.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Make every extraction call fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn phase_for(prompt: &str) -> Option<&'static str> {
        PROMPT_MARKERS
            .iter()
            .find(|(_, marker)| prompt.contains(marker))
            .map(|(phase, _)| *phase)
    }
}

#[async_trait]
impl VisionExtractionProvider for ScriptedProvider {
    async fn extract_from_image(
        &self,
        _image: &ImageRef,
        prompt: &str,
    ) -> MarqueeResult<ExtractionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::new(format!("{} is down", self.name)).into());
        }
        let phase = Self::phase_for(prompt).unwrap_or("consensus");
        let structured_data = self.replies.get(phase).cloned();
        Ok(ExtractionResponse {
            extracted_text: String::new(),
            structured_data,
            confidence: None,
            usage: None,
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

/// In-memory entity store with upsert semantics.
#[derive(Default)]
pub struct InMemoryEntityStore {
    entities: Mutex<BTreeMap<String, GraphEntity>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.lock().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entities.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn create_entities(&self, entities: &[GraphEntity]) -> MarqueeResult<()> {
        let mut map = self.entities.lock().unwrap();
        for entity in entities {
            map.insert(entity.name.clone(), entity.clone());
        }
        Ok(())
    }

    async fn get_entity(&self, name: &str) -> MarqueeResult<Option<GraphEntity>> {
        Ok(self.entities.lock().unwrap().get(name).cloned())
    }
}

/// In-memory relation store.
#[derive(Default)]
pub struct InMemoryRelationStore {
    relations: Mutex<Vec<GraphRelation>>,
}

impl InMemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.relations.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<GraphRelation> {
        self.relations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelationStore for InMemoryRelationStore {
    async fn create_relations(&self, relations: &[GraphRelation]) -> MarqueeResult<()> {
        self.relations.lock().unwrap().extend_from_slice(relations);
        Ok(())
    }
}

/// Fixed-table reference catalog.
#[derive(Default)]
pub struct StaticLookup {
    albums: HashMap<String, Vec<String>>,
    films: HashMap<String, Vec<String>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_albums(mut self, artist: &str, titles: &[&str]) -> Self {
        self.albums.insert(
            artist.to_string(),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_films(mut self, person: &str, titles: &[&str]) -> Self {
        self.films.insert(
            person.to_string(),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl ReferenceLookup for StaticLookup {
    async fn discography(&self, artist: &str) -> MarqueeResult<Vec<String>> {
        Ok(self.albums.get(artist).cloned().unwrap_or_default())
    }

    async fn filmography(&self, person: &str) -> MarqueeResult<Vec<String>> {
        Ok(self.films.get(person).cloned().unwrap_or_default())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Write a unique fake poster image into the temp dir and return its path.
pub fn temp_poster(bytes: &[u8]) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("marquee-test-{}.jpg", uuid::Uuid::new_v4()));
    std::fs::write(&path, bytes).unwrap();
    path
}
