//! Provider response types.

use serde::{Deserialize, Serialize};

/// Raw output from a vision extraction provider.
///
/// Providers always return the raw text; structured fields and confidence are
/// best-effort and may be absent depending on the backend.
///
/// # Examples
///
/// ```
/// use marquee_core::ExtractionResponse;
///
/// let response = ExtractionResponse {
///     extracted_text: "THE NATIONAL / Fri 14 June / Riverside Theater".to_string(),
///     structured_data: None,
///     confidence: Some(0.9),
///     usage: None,
/// };
/// assert!(response.structured_data.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtractionResponse {
    /// Raw text produced by the model
    pub extracted_text: String,
    /// Best-effort structured fields, when the backend parses its own output
    pub structured_data: Option<serde_json::Value>,
    /// Self-reported confidence in [0, 1], when available
    pub confidence: Option<f32>,
    /// Token usage, when the backend reports it
    pub usage: Option<ProviderUsage>,
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderUsage {
    /// Tokens consumed by the prompt and image
    pub input_tokens: u32,
    /// Tokens generated by the model
    pub output_tokens: u32,
}
