//! Per-run processing context and the session store.
//!
//! Each in-flight run owns exactly one [`ProcessingContext`], keyed by a
//! session id in the [`ContextStore`]. The context accumulates fields across
//! phases and is removed from the store on every exit path via the RAII
//! [`SessionGuard`], including early returns and panics.

use marquee_core::ImageRef;
use marquee_error::{MarqueeResult, PipelineError, PipelineErrorKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// One discovered field with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextField {
    /// Extracted value
    pub value: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Which phase (or "consensus") wrote the field
    pub source_phase: String,
}

/// Mutable state for one processing run.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    session_id: Uuid,
    image: ImageRef,
    fields: HashMap<String, ContextField>,
    errors: Vec<String>,
}

impl ProcessingContext {
    fn new(session_id: Uuid, image: ImageRef) -> Self {
        Self {
            session_id,
            image,
            fields: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Session identifier.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The image this run is processing.
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Record a discovered field, overwriting any prior value.
    pub fn record_field(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        confidence: f32,
        source_phase: impl Into<String>,
    ) {
        self.fields.insert(
            name.into(),
            ContextField {
                value: value.into(),
                confidence: confidence.clamp(0.0, 1.0),
                source_phase: source_phase.into(),
            },
        );
    }

    /// Look up a field with provenance.
    pub fn field(&self, name: &str) -> Option<&ContextField> {
        self.fields.get(name)
    }

    /// Look up just a field's value.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }

    /// Record a non-fatal error for the final result.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Errors accumulated so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Store of in-flight processing sessions.
///
/// Supports arbitrarily many concurrent, independent sessions. The map lock
/// is only held for registration and release; the per-session context uses a
/// tokio mutex so a run can hold it across provider awaits.
#[derive(Debug, Default)]
pub struct ContextStore {
    sessions: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<ProcessingContext>>>>,
}

impl ContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for an image. The returned guard releases the
    /// session when dropped.
    pub fn open(self: &Arc<Self>, image: ImageRef) -> SessionGuard {
        let session_id = Uuid::new_v4();
        let context = Arc::new(tokio::sync::Mutex::new(ProcessingContext::new(
            session_id, image,
        )));
        self.sessions
            .lock()
            .expect("context store lock poisoned")
            .insert(session_id, Arc::clone(&context));
        tracing::debug!(session_id = %session_id, "Opened processing session");
        SessionGuard {
            store: Arc::clone(self),
            session_id,
            context,
        }
    }

    /// Number of in-flight sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("context store lock poisoned")
            .len()
    }

    /// Whether no sessions are in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an in-flight session's context by id, for observers that did
    /// not open the session themselves.
    ///
    /// # Errors
    ///
    /// Fails when the session has already been released.
    pub fn get(
        &self,
        session_id: Uuid,
    ) -> MarqueeResult<Arc<tokio::sync::Mutex<ProcessingContext>>> {
        self.sessions
            .lock()
            .expect("context store lock poisoned")
            .get(&session_id)
            .cloned()
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::SessionNotFound(session_id.to_string()))
                    .into()
            })
    }

    /// Whether a session is currently registered.
    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions
            .lock()
            .expect("context store lock poisoned")
            .contains_key(&session_id)
    }

    fn release(&self, session_id: Uuid) {
        if self
            .sessions
            .lock()
            .expect("context store lock poisoned")
            .remove(&session_id)
            .is_some()
        {
            tracing::debug!(session_id = %session_id, "Released processing session");
        }
    }
}

/// RAII handle to one processing session.
///
/// Dropping the guard removes the session from the store, which is what
/// guarantees release on every exit path.
pub struct SessionGuard {
    store: Arc<ContextStore>,
    session_id: Uuid,
    context: Arc<tokio::sync::Mutex<ProcessingContext>>,
}

impl SessionGuard {
    /// Session identifier.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Lock the session's context. A run typically holds this for its whole
    /// duration; independent sessions never contend.
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ProcessingContext> {
        self.context.lock().await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.store.release(self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageRef {
        ImageRef::from_bytes("poster.jpg", b"bytes")
    }

    #[tokio::test]
    async fn guard_releases_session_on_drop() {
        let store = Arc::new(ContextStore::new());
        let id = {
            let guard = store.open(image());
            assert_eq!(store.len(), 1);
            guard.session_id()
        };
        assert!(!store.contains(id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = Arc::new(ContextStore::new());
        let a = store.open(image());
        let b = store.open(image());
        assert_ne!(a.session_id(), b.session_id());

        a.lock()
            .await
            .record_field("venue", "The Tivoli", 0.9, "venue");
        assert!(b.lock().await.field("venue").is_none());
        assert_eq!(
            a.lock().await.field_value("venue"),
            Some("The Tivoli")
        );
    }

    #[tokio::test]
    async fn released_sessions_cannot_be_fetched() {
        let store = Arc::new(ContextStore::new());
        let guard = store.open(image());
        let id = guard.session_id();
        assert!(store.get(id).is_ok());
        drop(guard);
        assert!(store.get(id).is_err());
    }

    #[tokio::test]
    async fn context_clamps_confidence_and_tracks_errors() {
        let store = Arc::new(ContextStore::new());
        let guard = store.open(image());
        let mut ctx = guard.lock().await;
        ctx.record_field("title", "Best Fest", 2.5, "event");
        assert_eq!(ctx.field("title").unwrap().confidence, 1.0);
        ctx.record_error("provider timed out");
        assert_eq!(ctx.errors().len(), 1);
    }
}
