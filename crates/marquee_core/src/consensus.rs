//! Consensus configuration and result types.

use crate::ExtractionResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the cross-provider consensus pass.
///
/// # Examples
///
/// ```
/// use marquee_core::ConsensusOptions;
///
/// let options = ConsensusOptions {
///     models: vec!["qwen-vl".to_string(), "llava".to_string()],
///     ..ConsensusOptions::default()
/// };
/// assert!(options.enabled);
/// assert_eq!(options.min_agreement_ratio, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct ConsensusOptions {
    /// Whether consensus is active
    #[serde(default = "default_enabled")]
    #[builder(default = "true")]
    pub enabled: bool,
    /// Provider names to fan out to, in deterministic tie-break order.
    /// Empty means "all registered providers".
    #[serde(default)]
    #[builder(default)]
    pub models: Vec<String>,
    /// Fraction of responding providers a plurality must exceed to be
    /// accepted (unanimity always passes)
    #[serde(default = "default_min_agreement_ratio")]
    #[builder(default = "default_min_agreement_ratio()")]
    pub min_agreement_ratio: f32,
    /// Fan out concurrently (sequential is useful only for debugging)
    #[serde(default = "default_parallel")]
    #[builder(default = "true")]
    pub parallel: bool,
    /// Per-provider deadline in milliseconds
    #[serde(default = "default_model_timeout_ms")]
    #[builder(default = "default_model_timeout_ms()")]
    pub model_timeout_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_min_agreement_ratio() -> f32 {
    0.5
}

fn default_parallel() -> bool {
    true
}

fn default_model_timeout_ms() -> u64 {
    30_000
}

impl Default for ConsensusOptions {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            models: Vec::new(),
            min_agreement_ratio: default_min_agreement_ratio(),
            parallel: default_parallel(),
            model_timeout_ms: default_model_timeout_ms(),
        }
    }
}

/// Consensus outcome for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConsensus {
    /// The accepted value (original casing of the first agreeing provider)
    pub value: String,
    /// Agreeing count / responding count, in [0, 1]
    pub agreement: f32,
    /// How many providers returned a non-empty value for this field
    pub responders: usize,
    /// True when every responder agreed after normalization
    pub unanimous: bool,
}

/// One provider's raw contribution, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutput {
    /// Provider model name
    pub provider: String,
    /// The response, absent when the provider failed or timed out
    pub response: Option<ExtractionResponse>,
    /// Failure description, when the provider did not respond
    pub error: Option<String>,
}

/// Result of one consensus invocation.
///
/// The agreement score is only meaningful when at least two providers
/// responded; degraded single-provider mode reports 1.0 with the `degraded`
/// caveat set. Total failure is reported via `failure`, never thrown, so the
/// orchestrator can fall back to single-provider processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConsensusResult {
    /// Provider names that were invoked
    pub providers: Vec<String>,
    /// Mean of per-field agreement ratios, in [0, 1]
    pub agreement_score: f32,
    /// Merged field values keyed by field name (deterministic order)
    pub merged_fields: BTreeMap<String, FieldConsensus>,
    /// Raw per-provider outputs for audit
    pub raw_outputs: Vec<ProviderOutput>,
    /// True when fewer than two providers responded and no real consensus
    /// was computed
    pub degraded: bool,
    /// Set when zero providers responded; the caller should fall back
    pub failure: Option<String>,
}

impl ConsensusResult {
    /// Whether consensus produced nothing usable.
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Merged value for one field, when present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.merged_fields.get(name).map(|f| f.value.as_str())
    }
}
