//! Processing options.

use crate::ConsensusOptions;
use serde::{Deserialize, Serialize};

/// Options recognized by the pipeline entry points.
///
/// # Examples
///
/// ```
/// use marquee_core::ProcessingOptions;
///
/// let options = ProcessingOptions::builder()
///     .skip_storage(true)
///     .build()
///     .unwrap();
/// assert!(options.skip_storage);
/// assert_eq!(options.batch_delay_ms, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct ProcessingOptions {
    /// Select a single extraction provider by model name
    #[serde(default)]
    #[builder(default)]
    pub model_key: Option<String>,
    /// Suppress graph writes (preview mode); the dedup ledger is still
    /// produced with every entity marked new
    #[serde(default)]
    #[builder(default)]
    pub skip_storage: bool,
    /// Optional cross-provider consensus configuration
    #[serde(default)]
    #[builder(default)]
    pub consensus: Option<ConsensusOptions>,
    /// Fixed delay between images in batch processing, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    #[builder(default = "default_batch_delay_ms()")]
    pub batch_delay_ms: u64,
    /// Minimum reviewer confidence for a draft to pass review
    #[serde(default = "default_review_threshold")]
    #[builder(default = "default_review_threshold()")]
    pub review_threshold: f32,
}

fn default_batch_delay_ms() -> u64 {
    500
}

fn default_review_threshold() -> f32 {
    0.7
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            model_key: None,
            skip_storage: false,
            consensus: None,
            batch_delay_ms: default_batch_delay_ms(),
            review_threshold: default_review_threshold(),
        }
    }
}

impl ProcessingOptions {
    /// Start building options from defaults.
    pub fn builder() -> ProcessingOptionsBuilder {
        ProcessingOptionsBuilder::default()
    }
}
