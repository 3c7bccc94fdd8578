//! The four core extraction phases.
//!
//! Contract: each phase builds its prompt (optionally reusing prior-phase
//! context), calls the provider exactly once, and parses the response into
//! its typed payload with tolerant parsing. Phases transition to
//! `NeedsReview` on low confidence, failed format checks, or disambiguation
//! heuristics; only the type phase can fail the run.

mod artist;
mod event;
mod poster_type;
mod venue;

pub use artist::ArtistPhase;
pub use event::EventPhase;
pub use poster_type::TypePhase;
pub use venue::VenuePhase;

use crate::context::ProcessingContext;
use marquee_core::{ExtractionResponse, ImageRef};
use marquee_interface::VisionExtractionProvider;

/// Run one provider call for a phase, downgrading errors to `None` and
/// recording them on the context. Non-type phases never hard-fail the run.
pub(crate) async fn call_provider(
    phase: &'static str,
    image: &ImageRef,
    prompt: &str,
    ctx: &mut ProcessingContext,
    provider: &dyn VisionExtractionProvider,
) -> Option<ExtractionResponse> {
    match provider.extract_from_image(image, prompt).await {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(
                phase,
                provider = provider.model_name(),
                error = %e,
                "Provider call failed"
            );
            ctx.record_error(format!("{phase}: provider failed: {e}"));
            None
        }
    }
}
