//! Best-effort reference-catalog enrichment.
//!
//! When a lookup collaborator is configured, the phase asks it for catalog
//! entries (albums, films) belonging to the people on the poster and keeps
//! the ones the poster text actually mentions, capped per artist. No lookup,
//! lookup errors, and zero matches are all non-fatal.

use crate::context::ProcessingContext;
use crate::heuristics::normalize_for_match;
use marquee_core::{
    CatalogKind, CatalogMatch, EnrichmentPayload, PhaseOutcome, PhaseResult, PhaseStatus,
    PosterEntity, PosterType,
};
use marquee_interface::ReferenceLookup;
use std::time::Instant;

/// At most this many catalog matches are kept per artist.
const MAX_MATCHES_PER_ARTIST: usize = 3;

/// Reference-catalog enrichment.
#[derive(Debug, Default)]
pub struct EnrichmentPhase;

impl EnrichmentPhase {
    /// Create the phase.
    pub fn new() -> Self {
        Self
    }

    /// Match catalog entries against the poster text.
    #[tracing::instrument(skip_all, fields(session_id = %ctx.session_id()))]
    pub async fn execute(
        &self,
        entity: &PosterEntity,
        ctx: &mut ProcessingContext,
        lookup: Option<&dyn ReferenceLookup>,
    ) -> PhaseResult {
        let started = Instant::now();

        let Some(lookup) = lookup else {
            tracing::debug!("No reference lookup configured, skipping enrichment");
            return PhaseResult::Enrichment {
                outcome: PhaseOutcome::new(PhaseStatus::Completed, 0.0, started.elapsed()),
                payload: EnrichmentPayload {
                    matches: Vec::new(),
                    lookup_available: false,
                },
            };
        };

        let poster_text = poster_text(entity, ctx);
        let poster_type = entity.poster_type();
        let mut matches = Vec::new();

        if poster_type != PosterType::Film {
            let mut artists: Vec<&str> = Vec::new();
            if let Some(headliner) = entity.headliner.as_deref() {
                artists.push(headliner);
            }
            artists.extend(entity.supporting_acts.iter().map(String::as_str));

            for artist in artists {
                match lookup.discography(artist).await {
                    Ok(titles) => matches.extend(matching_titles(
                        artist,
                        &titles,
                        &poster_text,
                        CatalogKind::Album,
                        lookup.source_name(),
                    )),
                    Err(e) => {
                        ctx.record_error(format!("enrichment: discography({artist}): {e}"));
                    }
                }
            }
        }

        if matches!(poster_type, PosterType::Film | PosterType::Hybrid) {
            let mut people: Vec<&str> = Vec::new();
            if let Some(director) = entity.director.as_deref() {
                people.push(director);
            }
            people.extend(entity.cast.iter().map(String::as_str));

            for person in people {
                match lookup.filmography(person).await {
                    Ok(titles) => matches.extend(matching_titles(
                        person,
                        &titles,
                        &poster_text,
                        CatalogKind::Film,
                        lookup.source_name(),
                    )),
                    Err(e) => {
                        ctx.record_error(format!("enrichment: filmography({person}): {e}"));
                    }
                }
            }
        }

        tracing::info!(
            matches = matches.len(),
            source = lookup.source_name(),
            "Enrichment finished"
        );

        PhaseResult::Enrichment {
            outcome: PhaseOutcome::new(PhaseStatus::Completed, 1.0, started.elapsed()),
            payload: EnrichmentPayload {
                matches,
                lookup_available: true,
            },
        }
    }
}

/// All the poster text a catalog title could appear in, pre-normalized.
fn poster_text(entity: &PosterEntity, ctx: &ProcessingContext) -> String {
    let mut parts = Vec::new();
    if let Some(text) = ctx.field_value("extracted_text") {
        parts.push(text.to_string());
    }
    if let Some(title) = &entity.title {
        parts.push(title.clone());
    }
    normalize_for_match(&parts.join(" "))
}

fn matching_titles(
    artist: &str,
    titles: &[String],
    poster_text: &str,
    kind: CatalogKind,
    source: &str,
) -> Vec<CatalogMatch> {
    titles
        .iter()
        .filter(|title| {
            let normalized = normalize_for_match(title);
            !normalized.is_empty() && poster_text.contains(&normalized)
        })
        .take(MAX_MATCHES_PER_ARTIST)
        .map(|title| CatalogMatch {
            artist: artist.to_string(),
            title: title.clone(),
            kind,
            source: source.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_match_case_insensitively_and_cap_per_artist() {
        let titles: Vec<String> = ["In Rainbows", "OK Computer", "Kid A", "Amnesiac"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let poster =
            normalize_for_match("RADIOHEAD in rainbows OK COMPUTER kid a amnesiac tour");
        let matches = matching_titles("Radiohead", &titles, &poster, CatalogKind::Album, "mb");
        assert_eq!(matches.len(), MAX_MATCHES_PER_ARTIST);
        assert!(matches.iter().all(|m| m.artist == "Radiohead"));
    }

    #[test]
    fn unmentioned_titles_do_not_match() {
        let titles = vec!["In Rainbows".to_string()];
        let poster = normalize_for_match("RADIOHEAD live at the forum");
        let matches = matching_titles("Radiohead", &titles, &poster, CatalogKind::Album, "mb");
        assert!(matches.is_empty());
    }
}
