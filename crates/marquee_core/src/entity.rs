//! The assembled poster record.

use crate::{PosterType, TypeInference};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing provenance carried on every assembled poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// SHA-256 content hash of the source image (the poster identifier)
    pub source_hash: String,
    /// Model that produced the extraction
    pub model: String,
    /// Overall extraction confidence in [0, 1]
    pub extraction_confidence: f32,
    /// When processing completed
    pub processed_at: DateTime<Utc>,
}

impl ProcessingMetadata {
    /// Build metadata stamped with the current time.
    pub fn new(source_hash: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            source_hash: source_hash.into(),
            model: model.into(),
            extraction_confidence: 0.0,
            processed_at: Utc::now(),
        }
    }
}

/// The assembled poster record.
///
/// Invariant: at most one entry of `inferred_types` has `is_primary = true`,
/// and exactly one whenever the list is non-empty. Use
/// [`PosterEntity::set_primary_type`] and [`PosterEntity::add_type_inference`]
/// to keep it that way.
///
/// # Examples
///
/// ```
/// use marquee_core::{PosterEntity, PosterType, ProcessingMetadata};
///
/// let mut entity = PosterEntity::new(ProcessingMetadata::new("abc123", "scripted"));
/// entity.set_primary_type(PosterType::Concert, 0.92, None, "type");
/// assert_eq!(entity.poster_type(), PosterType::Concert);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterEntity {
    /// Poster or event title
    pub title: Option<String>,
    /// Top-billed performer
    pub headliner: Option<String>,
    /// Supporting acts in billing order
    pub supporting_acts: Vec<String>,
    /// Venue name
    pub venue: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or region
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Show dates as raw text
    pub dates: Vec<String>,
    /// Ticket price text
    pub ticket_price: Option<String>,
    /// Record label or promoter, when printed
    pub label: Option<String>,
    /// Director, for film posters
    pub director: Option<String>,
    /// Cast members, for film posters
    pub cast: Vec<String>,
    /// Type inferences with provenance
    pub inferred_types: Vec<TypeInference>,
    /// Processing provenance
    pub metadata: ProcessingMetadata,
}

impl PosterEntity {
    /// Build an empty entity carrying the given provenance.
    pub fn new(metadata: ProcessingMetadata) -> Self {
        Self {
            title: None,
            headliner: None,
            supporting_acts: Vec::new(),
            venue: None,
            city: None,
            state: None,
            country: None,
            dates: Vec::new(),
            ticket_price: None,
            label: None,
            director: None,
            cast: Vec::new(),
            inferred_types: Vec::new(),
            metadata,
        }
    }

    /// The primary poster type, or `Unknown` when nothing was inferred.
    pub fn poster_type(&self) -> PosterType {
        self.inferred_types
            .iter()
            .find(|t| t.is_primary)
            .map(|t| t.type_key)
            .unwrap_or_default()
    }

    /// Set the primary type, demoting any prior primary inference.
    pub fn set_primary_type(
        &mut self,
        type_key: PosterType,
        confidence: f32,
        evidence: Option<String>,
        source: impl Into<String>,
    ) {
        for inference in &mut self.inferred_types {
            inference.is_primary = false;
        }
        self.inferred_types.push(TypeInference {
            type_key,
            confidence: confidence.clamp(0.0, 1.0),
            evidence,
            source: source.into(),
            is_primary: true,
        });
    }

    /// Add a non-primary inference, unless one for the same type exists.
    ///
    /// If the incoming inference claims primacy it goes through the same
    /// demotion path as [`PosterEntity::set_primary_type`].
    pub fn add_type_inference(&mut self, inference: TypeInference) {
        if inference.is_primary {
            self.set_primary_type(
                inference.type_key,
                inference.confidence,
                inference.evidence,
                inference.source,
            );
            return;
        }
        if self
            .inferred_types
            .iter()
            .any(|t| t.type_key == inference.type_key)
        {
            return;
        }
        self.inferred_types.push(inference);
    }

    /// Read a scalar field by its review-correction name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => self.title.as_deref(),
            "headliner" => self.headliner.as_deref(),
            "venue" => self.venue.as_deref(),
            "city" => self.city.as_deref(),
            "state" => self.state.as_deref(),
            "country" => self.country.as_deref(),
            "ticket_price" => self.ticket_price.as_deref(),
            "label" => self.label.as_deref(),
            "director" => self.director.as_deref(),
            _ => None,
        }
    }

    /// Write (or clear, with `None`) a field by its review-correction name.
    ///
    /// Returns false when the name is not a correctable field. List fields
    /// are accepted too: "dates" replaces the whole list with the single
    /// value, "cast" splits a comma-separated value, `None` clears either.
    pub fn set_field(&mut self, name: &str, value: Option<String>) -> bool {
        match name {
            "title" => self.title = value,
            "headliner" => self.headliner = value,
            "venue" => self.venue = value,
            "city" => self.city = value,
            "state" => self.state = value,
            "country" => self.country = value,
            "ticket_price" => self.ticket_price = value,
            "label" => self.label = value,
            "director" => self.director = value,
            "dates" => self.dates = value.map(|v| vec![v]).unwrap_or_default(),
            "cast" => {
                self.cast = value
                    .map(|v| {
                        v.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default()
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> PosterEntity {
        PosterEntity::new(ProcessingMetadata::new("hash", "model"))
    }

    #[test]
    fn primary_type_is_unique() {
        let mut e = entity();
        e.set_primary_type(PosterType::Concert, 0.8, None, "type");
        e.set_primary_type(PosterType::Album, 0.9, None, "review");
        let primaries: Vec<_> = e.inferred_types.iter().filter(|t| t.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].type_key, PosterType::Album);
    }

    #[test]
    fn add_inference_skips_duplicates() {
        let mut e = entity();
        e.set_primary_type(PosterType::Concert, 0.8, None, "type");
        e.add_type_inference(TypeInference {
            type_key: PosterType::Concert,
            confidence: 0.5,
            evidence: None,
            source: "consensus".to_string(),
            is_primary: false,
        });
        assert_eq!(e.inferred_types.len(), 1);
    }

    #[test]
    fn set_field_clears_with_none() {
        let mut e = entity();
        e.headliner = Some("Sunday 27 January Prince of Wales".to_string());
        assert!(e.set_field("headliner", None));
        assert!(e.headliner.is_none());
    }

    #[test]
    fn set_field_splits_cast_lists() {
        let mut e = entity();
        assert!(e.set_field(
            "cast",
            Some("David Byrne, Tina Weymouth, ".to_string())
        ));
        assert_eq!(e.cast, vec!["David Byrne", "Tina Weymouth"]);
        assert!(e.set_field("cast", None));
        assert!(e.cast.is_empty());
    }

    #[test]
    fn set_field_rejects_unknown_names() {
        let mut e = entity();
        assert!(!e.set_field("barcode", Some("x".to_string())));
    }

    #[test]
    fn poster_type_defaults_to_unknown() {
        assert_eq!(entity().poster_type(), PosterType::Unknown);
    }
}
