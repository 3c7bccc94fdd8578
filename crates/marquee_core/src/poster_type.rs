//! Poster taxonomy types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed set of poster types.
///
/// Classification is the first pipeline phase; every downstream phase and the
/// assembly dispatch depend on it.
///
/// # Examples
///
/// ```
/// use marquee_core::PosterType;
///
/// assert!(PosterType::Festival.is_concert_family());
/// assert_eq!(PosterType::parse_lenient("FILM"), PosterType::Film);
/// assert_eq!(PosterType::parse_lenient("something else"), PosterType::Unknown);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PosterType {
    /// Single-bill live music event
    Concert,
    /// Multi-act festival
    Festival,
    /// Stand-up or sketch comedy show
    Comedy,
    /// Stage play or musical
    Theater,
    /// Film release or screening
    Film,
    /// Album or single release
    Album,
    /// Generic promotional material
    Promo,
    /// Gallery or museum exhibition
    Exhibition,
    /// Combined release + event (e.g. album launch show)
    Hybrid,
    /// Could not be classified
    #[default]
    Unknown,
}

impl PosterType {
    /// Whether this type assembles with the concert-family strategy
    /// (venue + event + per-date shows).
    pub fn is_concert_family(&self) -> bool {
        matches!(
            self,
            Self::Concert | Self::Festival | Self::Comedy | Self::Theater
        )
    }

    /// Parse a model-reported type string, falling back to `Unknown`.
    ///
    /// Matching is case-insensitive and tolerates a few common synonyms the
    /// models produce ("gig", "movie", "record").
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(parsed) = Self::from_str(trimmed) {
            return parsed;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "gig" | "show" | "tour" => Self::Concert,
            "movie" | "cinema" => Self::Film,
            "record" | "release" | "single" | "ep" | "lp" => Self::Album,
            "play" | "musical" | "theatre" => Self::Theater,
            "standup" | "stand-up" => Self::Comedy,
            _ => Self::Unknown,
        }
    }
}

/// A single type inference with provenance.
///
/// A poster may carry several inferences (e.g. hybrid album-launch posters),
/// but at most one may be primary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInference {
    /// Inferred poster type
    pub type_key: PosterType,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Supporting evidence from the poster text, when reported
    pub evidence: Option<String>,
    /// Which phase or provider produced this inference
    pub source: String,
    /// Whether this is the primary classification
    pub is_primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn lenient_parse_handles_synonyms() {
        assert_eq!(PosterType::parse_lenient("gig"), PosterType::Concert);
        assert_eq!(PosterType::parse_lenient("Movie"), PosterType::Film);
        assert_eq!(PosterType::parse_lenient(" theatre "), PosterType::Theater);
    }

    #[test]
    fn lenient_parse_round_trips_display() {
        for t in PosterType::iter() {
            assert_eq!(PosterType::parse_lenient(&t.to_string()), t);
        }
    }

    #[test]
    fn concert_family_membership() {
        assert!(PosterType::Comedy.is_concert_family());
        assert!(!PosterType::Album.is_concert_family());
        assert!(!PosterType::Unknown.is_concert_family());
    }
}
